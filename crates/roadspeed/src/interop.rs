//! Conversions between the workspace image types and `image` buffers.

use roadspeed_core::{GrayImage, GrayImageView, ImageView, RgbImage};

/// Copy into an `image` buffer, e.g. to hand a mask to `imageproc` or save
/// an intermediate stage.
pub fn to_image_gray(img: &GrayImageView<'_>) -> image::GrayImage {
    image::GrayImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        image::Luma([img.get(x as usize, y as usize)])
    })
}

pub fn from_image_gray(img: image::GrayImage) -> GrayImage {
    GrayImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.into_raw(),
    }
}

pub fn to_image_rgb(img: &ImageView<'_, [u8; 3]>) -> image::RgbImage {
    image::RgbImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        image::Rgb(img.get(x as usize, y as usize))
    })
}

pub fn from_image_rgb(img: &image::RgbImage) -> RgbImage {
    RgbImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.pixels().map(|p| p.0).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_layout_survives_both_directions() {
        let g = GrayImage::from_fn(3, 2, |x, y| (x + 10 * y) as u8);
        let out = to_image_gray(&g.view());
        assert_eq!(out.get_pixel(2, 1).0, [12]);
        assert_eq!(from_image_gray(out), g);
    }

    #[test]
    fn rgb_pixels_keep_their_channels() {
        let rgb = RgbImage::from_fn(2, 2, |x, y| [x as u8, y as u8, 7]);
        let out = to_image_rgb(&rgb.view());
        assert_eq!(out.get_pixel(1, 0).0, [1, 0, 7]);
        assert_eq!(from_image_rgb(&out), rgb);
    }
}
