//! Grayscale conversion and median blur applied to each rectified frame.

use crate::interop::{from_image_gray, to_image_gray};
use imageproc::filter::median_filter;
use roadspeed_core::{GrayImage, GrayImageView, ImageError, ImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Luma in 14-bit fixed point (BT.601 weights, rounded).
#[inline]
fn luma(p: [u8; 3]) -> u8 {
    let [r, g, b] = p.map(u32::from);
    ((4899 * r + 9617 * g + 1868 * b + 8192) >> 14) as u8
}

/// Convert an RGB image to 8-bit luma.
pub fn rgb_to_gray(img: &ImageView<'_, [u8; 3]>) -> GrayImage {
    let (w, h) = img.dims();
    GrayImage::from_fn(w, h, |x, y| luma(img.get(x, y)))
}

/// Median of each `ksize x ksize` neighbourhood, replicating border pixels.
///
/// `ksize` must be odd; `1` returns a copy.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width, h = img.height))
)]
pub fn median_blur(img: &GrayImageView<'_>, ksize: usize) -> Result<GrayImage, ImageError> {
    if ksize == 0 || ksize % 2 == 0 {
        return Err(ImageError::InvalidWindow { size: ksize });
    }
    if ksize == 1 || img.is_empty() {
        return Ok(img.to_owned_image());
    }
    let r = (ksize / 2) as u32;
    let blurred = median_filter(&to_image_gray(img), r, r);
    Ok(from_image_gray(blurred))
}
