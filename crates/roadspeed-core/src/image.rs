use crate::ImageError;

/// Owned row-major image, `data.len() == width * height`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<P> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<P>,
}

/// Borrowed row-major image.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a, P> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [P], // row-major, len = w*h
}

pub type GrayImage = Image<u8>;
pub type GrayImageView<'a> = ImageView<'a, u8>;
pub type RgbImage = Image<[u8; 3]>;
pub type FloatImage = Image<f64>;

impl<P: Copy> Image<P> {
    /// Image of the given size with every sample set to `fill`.
    pub fn filled(width: usize, height: usize, fill: P) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    /// Wrap an existing buffer, checking its length.
    pub fn from_vec(width: usize, height: usize, data: Vec<P>) -> Result<Self, ImageError> {
        if data.len() != width * height {
            return Err(ImageError::BufferLength {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build an image by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> P) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> ImageView<'_, P> {
        ImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> P {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: P) {
        self.data[y * self.width + x] = v;
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl<'a, P: Copy> ImageView<'a, P> {
    /// Borrow a raw buffer, checking its length.
    pub fn new(width: usize, height: usize, data: &'a [P]) -> Result<Self, ImageError> {
        if data.len() != width * height {
            return Err(ImageError::BufferLength {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> P {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &'a [P] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn to_owned_image(&self) -> Image<P> {
        Image {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }

    /// Check that two views cover the same grid.
    pub(crate) fn ensure_same_dims<Q>(&self, other: &ImageView<'_, Q>) -> Result<(), ImageError> {
        if self.width != other.width || self.height != other.height {
            return Err(ImageError::DimensionMismatch {
                expected: self.dims(),
                actual: (other.width, other.height),
            });
        }
        Ok(())
    }

    pub(crate) fn ensure_non_empty(&self) -> Result<(), ImageError> {
        if self.is_empty() {
            return Err(ImageError::EmptyImage);
        }
        Ok(())
    }
}

impl<'a, P> From<&'a Image<P>> for ImageView<'a, P> {
    fn from(img: &'a Image<P>) -> Self {
        ImageView {
            width: img.width,
            height: img.height,
            data: &img.data,
        }
    }
}

impl GrayImage {
    /// Number of non-zero samples.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_checks_length() {
        assert!(GrayImage::from_vec(3, 2, vec![0; 6]).is_ok());
        let err = GrayImage::from_vec(3, 2, vec![0; 5]).unwrap_err();
        assert_eq!(
            err,
            ImageError::BufferLength {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn from_fn_is_row_major() {
        let img = Image::from_fn(3, 2, |x, y| (10 * y + x) as u8);
        assert_eq!(img.data, vec![0, 1, 2, 10, 11, 12]);
        assert_eq!(img.view().row(1), &[10, 11, 12]);
        assert_eq!(img.get(2, 1), 12);
    }

    #[test]
    fn dimension_check_reports_both_sizes() {
        let a = GrayImage::filled(4, 3, 0);
        let b = FloatImage::filled(3, 4, 0.0);
        let err = a.view().ensure_same_dims(&b.view()).unwrap_err();
        assert_eq!(
            err,
            ImageError::DimensionMismatch {
                expected: (4, 3),
                actual: (3, 4)
            }
        );
    }
}
