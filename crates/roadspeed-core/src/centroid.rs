use nalgebra::Point2;

/// Mean of the boundary points of a blob.
///
/// This is the centroid of the outline samples, not of the filled area, so
/// long straight edges compressed to two points weigh as much as a single
/// corner. Returns `None` for an empty boundary.
pub fn boundary_centroid(points: &[Point2<i32>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| {
        (sx + p.x as f64, sy + p.y as f64)
    });
    Some(Point2::new(sx / n, sy / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn averages_boundary_points() {
        let pts = [
            Point2::new(0, 0),
            Point2::new(4, 0),
            Point2::new(4, 2),
            Point2::new(0, 2),
        ];
        let c = boundary_centroid(&pts).unwrap();
        assert_abs_diff_eq!(c.x, 2.0);
        assert_abs_diff_eq!(c.y, 1.0);
    }

    #[test]
    fn weights_points_not_area() {
        // an extra sample on the bottom edge pulls the centroid down
        let pts = [
            Point2::new(0, 0),
            Point2::new(4, 0),
            Point2::new(4, 4),
            Point2::new(2, 4),
            Point2::new(0, 4),
        ];
        let c = boundary_centroid(&pts).unwrap();
        assert_abs_diff_eq!(c.x, 2.0);
        assert_abs_diff_eq!(c.y, 12.0 / 5.0);
    }

    #[test]
    fn empty_boundary_has_no_centroid() {
        assert!(boundary_centroid(&[]).is_none());
    }
}
