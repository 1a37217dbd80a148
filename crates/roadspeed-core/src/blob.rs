use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned integer box; `bottom_right` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn top_left(&self) -> [i32; 2] {
        [self.x, self.y]
    }

    #[inline]
    pub fn bottom_right(&self) -> [i32; 2] {
        [self.x + self.width, self.y + self.height]
    }

    /// `width * height`, widened so large boxes cannot overflow.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// One connected region of a binary mask, as reported by a region extractor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    pub bbox: BoundingBox,
    /// Ordered outer boundary samples.
    pub boundary: Vec<Point2<i32>>,
}

impl Blob {
    pub fn new(bbox: BoundingBox, boundary: Vec<Point2<i32>>) -> Self {
        Self { bbox, boundary }
    }

    pub fn centroid(&self) -> Option<Point2<f64>> {
        crate::boundary_centroid(&self.boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_corners_and_area() {
        let b = BoundingBox::new(10, 20, 30, 40);
        assert_eq!(b.top_left(), [10, 20]);
        assert_eq!(b.bottom_right(), [40, 60]);
        assert_eq!(b.area(), 1200);
        assert!(!b.is_degenerate());
        assert!(BoundingBox::new(0, 0, 0, 5).is_degenerate());
        assert!(BoundingBox::new(0, 0, 3, -1).is_degenerate());
    }
}
