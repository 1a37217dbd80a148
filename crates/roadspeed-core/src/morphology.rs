//! Binary morphology over `FOREGROUND` / `BACKGROUND` masks.
//!
//! Neighbourhoods are anchored with the offset `i - size + round(size / 2)`
//! per axis (round half to even). Sizes 3 and 7 come out centred; sizes 1 and
//! 5 are shifted one cell towards negative offsets.
//!
//! Border handling is skip, not padding: an element cell whose neighbour lies
//! outside the image never falsifies an erosion and never counts as a hit for
//! a dilation.

use crate::rows::for_each_row;
use crate::{GrayImage, GrayImageView, ImageError};

#[cfg(feature = "tracing")]
use tracing::instrument;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Neighbourhood pattern; every cell is either `FOREGROUND` or `BACKGROUND`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuringElement {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl StructuringElement {
    /// All-foreground `width x height` rectangle.
    pub fn rect(width: usize, height: usize) -> Result<Self, ImageError> {
        Self::from_raw(width, height, vec![FOREGROUND; width * height])
    }

    pub fn from_bools(width: usize, height: usize, cells: &[bool]) -> Result<Self, ImageError> {
        let raw = cells
            .iter()
            .map(|&on| if on { FOREGROUND } else { BACKGROUND })
            .collect();
        Self::from_raw(width, height, raw)
    }

    /// Row-major cells; any non-zero value becomes `FOREGROUND`.
    pub fn from_raw(width: usize, height: usize, mut cells: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidWindow {
                size: width.min(height),
            });
        }
        if cells.len() != width * height {
            return Err(ImageError::BufferLength {
                expected: width * height,
                actual: cells.len(),
            });
        }
        for c in &mut cells {
            *c = if *c != 0 { FOREGROUND } else { BACKGROUND };
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    fn taps(&self) -> Vec<Tap> {
        let ax = anchor(self.width);
        let ay = anchor(self.height);
        let mut taps = Vec::with_capacity(self.cells.len());
        for row in 0..self.height {
            for col in 0..self.width {
                taps.push(Tap {
                    dx: col as isize - ax,
                    dy: row as isize - ay,
                    value: self.cell(col, row),
                });
            }
        }
        taps
    }

    fn check_fits(&self, image: &GrayImageView<'_>) -> Result<(), ImageError> {
        image.ensure_non_empty()?;
        if self.width > image.width || self.height > image.height {
            return Err(ImageError::DimensionMismatch {
                expected: image.dims(),
                actual: (self.width, self.height),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Tap {
    dx: isize,
    dy: isize,
    value: u8,
}

/// `size - round_half_even(size / 2)`; cell `i` sits at offset `i - anchor`.
#[inline]
fn anchor(size: usize) -> isize {
    size as isize - (size as f64 / 2.0).round_ties_even() as isize
}

#[derive(Clone, Copy)]
enum Pass {
    Erode,
    Dilate,
}

fn run_pass(image: &GrayImageView<'_>, taps: &[Tap], pass: Pass) -> GrayImage {
    let (w, h) = (image.width as isize, image.height as isize);
    let mut out = GrayImage::filled(image.width, image.height, BACKGROUND);

    for_each_row(&mut out.data, image.width, |y, row| {
        let y = y as isize;
        for (x, px) in row.iter_mut().enumerate() {
            let x = x as isize;
            let mut in_bounds = taps.iter().filter_map(|t| {
                let (tx, ty) = (x + t.dx, y + t.dy);
                if tx < 0 || ty < 0 || tx >= w || ty >= h {
                    return None;
                }
                Some(image.data[ty as usize * image.width + tx as usize] == t.value)
            });
            let on = match pass {
                Pass::Erode => in_bounds.all(|matches| matches),
                Pass::Dilate => in_bounds.any(|matches| matches),
            };
            if on {
                *px = FOREGROUND;
            }
        }
    });

    out
}

fn run_passes(
    image: &GrayImageView<'_>,
    element: &StructuringElement,
    schedule: &[(Pass, usize)],
) -> Result<GrayImage, ImageError> {
    element.check_fits(image)?;
    let taps = element.taps();

    let mut current = image.to_owned_image();
    for &(pass, n) in schedule {
        for _ in 0..n {
            current = run_pass(&current.view(), &taps, pass);
        }
    }
    Ok(current)
}

/// Pixel is foreground iff every in-bounds neighbour equals its element cell.
pub fn erode(
    image: &GrayImageView<'_>,
    element: &StructuringElement,
) -> Result<GrayImage, ImageError> {
    run_passes(image, element, &[(Pass::Erode, 1)])
}

/// Pixel is foreground iff at least one in-bounds neighbour equals its
/// element cell.
pub fn dilate(
    image: &GrayImageView<'_>,
    element: &StructuringElement,
) -> Result<GrayImage, ImageError> {
    run_passes(image, element, &[(Pass::Dilate, 1)])
}

/// `iterations` erosions followed by `iterations` dilations.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image, element), fields(w = image.width, h = image.height))
)]
pub fn opening(
    image: &GrayImageView<'_>,
    element: &StructuringElement,
    iterations: usize,
) -> Result<GrayImage, ImageError> {
    run_passes(
        image,
        element,
        &[(Pass::Erode, iterations), (Pass::Dilate, iterations)],
    )
}

/// `iterations` dilations followed by `iterations` erosions.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image, element), fields(w = image.width, h = image.height))
)]
pub fn closing(
    image: &GrayImageView<'_>,
    element: &StructuringElement,
    iterations: usize,
) -> Result<GrayImage, ImageError> {
    run_passes(
        image,
        element,
        &[(Pass::Dilate, iterations), (Pass::Erode, iterations)],
    )
}
