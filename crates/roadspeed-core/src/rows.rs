//! Row-partitioned execution of a single full-image pass.
//!
//! Output rows are disjoint `&mut` slices, so a pass can run them on worker
//! threads without locking. The pass returns only after every row is written,
//! which is the barrier between passes that feed each other.

/// Call `f(y, row)` for every output row of a `width`-wide buffer.
pub(crate) fn for_each_row<P, F>(out: &mut [P], width: usize, f: F)
where
    P: Send,
    F: Fn(usize, &mut [P]) + Sync,
{
    if width == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }

    #[cfg(not(feature = "rayon"))]
    for (y, row) in out.chunks_mut(width).enumerate() {
        f(y, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visits_every_row_once() {
        let mut buf = vec![0usize; 12];
        for_each_row(&mut buf, 4, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                *v += y * 10 + x;
            }
        });
        assert_eq!(buf, vec![0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23]);
    }

    // reachable through `--no-default-features` on every dependent crate
    #[cfg(not(feature = "rayon"))]
    #[test]
    fn sequential_build_visits_rows_top_down() {
        let order = std::sync::Mutex::new(Vec::new());
        let mut buf = vec![0u8; 6];
        for_each_row(&mut buf, 2, |y, _| order.lock().unwrap().push(y));
        assert_eq!(order.into_inner().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn zero_width_is_a_no_op() {
        let mut buf: Vec<u8> = Vec::new();
        for_each_row(&mut buf, 0, |_, _| panic!("no rows expected"));
    }
}
