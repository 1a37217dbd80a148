use crate::rows::for_each_row;
use crate::{Homography, Image, ImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Warp `src` into `dst`: every destination pixel `(x, y)` is mapped through
/// `h_src_from_dst` and, if it lands inside `src`, takes the nearest source
/// sample. Pixels that project outside `src`, or onto the line at infinity
/// (zero denominator), keep their current value.
///
/// A projection `(x_in, y_in)` is inside iff `x_in >= 0`, `y_in >= 0` and the
/// rounded indices (half to even) are below `src.width` / `src.height`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(w = dst.width, h = dst.height))
)]
pub fn warp_perspective_into<P>(src: &ImageView<'_, P>, dst: &mut Image<P>, h_src_from_dst: &Homography)
where
    P: Copy + Send + Sync,
{
    let m = h_src_from_dst.to_array();
    let (src_w, src_h) = (src.width, src.height);

    for_each_row(&mut dst.data, dst.width, |y, row| {
        let yf = y as f64;
        for (x, out) in row.iter_mut().enumerate() {
            let xf = x as f64;
            let denom = m[2][0] * xf + m[2][1] * yf + m[2][2];
            if denom == 0.0 {
                continue;
            }
            let x_in = (m[0][0] * xf + m[0][1] * yf + m[0][2]) / denom;
            let y_in = (m[1][0] * xf + m[1][1] * yf + m[1][2]) / denom;
            if let Some((sx, sy)) = nearest_index(x_in, y_in, src_w, src_h) {
                *out = src.data[sy * src_w + sx];
            }
        }
    });
}

/// Allocate a `out_w x out_h` destination filled with `fill` and warp into it.
pub fn warp_perspective<P>(
    src: &ImageView<'_, P>,
    h_src_from_dst: &Homography,
    out_w: usize,
    out_h: usize,
    fill: P,
) -> Image<P>
where
    P: Copy + Send + Sync,
{
    let mut out = Image::filled(out_w, out_h, fill);
    warp_perspective_into(src, &mut out, h_src_from_dst);
    out
}

#[inline]
fn nearest_index(x_in: f64, y_in: f64, w: usize, h: usize) -> Option<(usize, usize)> {
    // NaN fails both comparisons
    if !(x_in >= 0.0 && y_in >= 0.0) {
        return None;
    }
    let sx = x_in.round_ties_even();
    let sy = y_in.round_ties_even();
    if sx < w as f64 && sy < h as f64 {
        Some((sx as usize, sy as usize))
    } else {
        None
    }
}
