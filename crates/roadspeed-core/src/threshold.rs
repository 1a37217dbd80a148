use crate::rows::for_each_row;
use crate::{GrayImage, GrayImageView, BACKGROUND, FOREGROUND};

/// `FOREGROUND` where `image < level`, `BACKGROUND` elsewhere.
pub fn inverse_threshold(image: &GrayImageView<'_>, level: u8) -> GrayImage {
    let mut out = GrayImage::filled(image.width, image.height, BACKGROUND);
    for_each_row(&mut out.data, image.width, |y, row| {
        for (dst, &src) in row.iter_mut().zip(image.row(y)) {
            if src < level {
                *dst = FOREGROUND;
            }
        }
    });
    out
}
