//! Windowed structural similarity between two grayscale images.
//!
//! Windows are `window_size` wide, start `window_size / 2` pixels before the
//! centre pixel and are clipped (shrunk) at the image borders. Means and
//! variances are population statistics over the clipped window; the covariance
//! uses the sample form (divided by `area - 1`). The mixed normalization is
//! part of the statistic: for identical inputs the per-pixel value is
//! `(2·n/(n-1)·v + C2) / (2·v + C2)`, which only reaches exactly 1 on flat
//! windows.

use crate::rows::for_each_row;
use crate::{FloatImage, GrayImage, GrayImageView, Image, ImageError};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Constants of the SSIM statistic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsimParams {
    /// Side of the square window, in pixels.
    pub window_size: usize,
    pub k1: f64,
    pub k2: f64,
    /// Dynamic range `L` of the samples.
    pub dynamic_range: f64,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self {
            window_size: 7,
            k1: 0.01,
            k2: 0.03,
            dynamic_range: 255.0,
        }
    }
}

impl SsimParams {
    /// `(k1 · L)²`
    #[inline]
    pub fn c1(&self) -> f64 {
        (self.k1 * self.dynamic_range).powi(2)
    }

    /// `(k2 · L)²`
    #[inline]
    pub fn c2(&self) -> f64 {
        (self.k2 * self.dynamic_range).powi(2)
    }
}

/// Per-pixel similarity plus its arithmetic mean.
#[derive(Clone, Debug, PartialEq)]
pub struct SsimMap {
    pub map: FloatImage,
    pub score: f64,
}

impl SsimMap {
    /// Scale to 8 bit: `clamp(v · 255, 0, 255)`, truncated.
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .map
            .data
            .iter()
            .map(|&v| (v * 255.0).clamp(0.0, 255.0) as u8)
            .collect();
        GrayImage {
            width: self.map.width,
            height: self.map.height,
            data,
        }
    }
}

/// Clipped window `[y0, y1) x [x0, x1)` around `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Window {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

impl Window {
    #[inline]
    fn around(x: usize, y: usize, size: usize, width: usize, height: usize) -> Self {
        let half = size / 2;
        Self {
            x0: x.saturating_sub(half),
            x1: (x + size - half).min(width),
            y0: y.saturating_sub(half),
            y1: (y + size - half).min(height),
        }
    }

    #[inline]
    fn area(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

/// Summed-area tables of samples and squared samples, `(w + 1) x (h + 1)`.
struct IntegralImage {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl IntegralImage {
    fn new(img: &GrayImageView<'_>) -> Self {
        let stride = img.width + 1;
        let mut sum = vec![0.0; stride * (img.height + 1)];
        let mut sum_sq = vec![0.0; stride * (img.height + 1)];
        for y in 0..img.height {
            let mut row = 0.0;
            let mut row_sq = 0.0;
            for (x, &v) in img.row(y).iter().enumerate() {
                let v = v as f64;
                row += v;
                row_sq += v * v;
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + row;
                sum_sq[i] = sum_sq[i - stride] + row_sq;
            }
        }
        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    #[inline]
    fn rect(table: &[f64], stride: usize, w: &Window) -> f64 {
        table[w.y1 * stride + w.x1] - table[w.y0 * stride + w.x1] - table[w.y1 * stride + w.x0]
            + table[w.y0 * stride + w.x0]
    }

    #[inline]
    fn mean(&self, w: &Window) -> f64 {
        Self::rect(&self.sum, self.stride, w) / w.area() as f64
    }

    #[inline]
    fn variance(&self, w: &Window) -> f64 {
        let n = w.area() as f64;
        let mean = Self::rect(&self.sum, self.stride, w) / n;
        (Self::rect(&self.sum_sq, self.stride, w) / n - mean * mean).max(0.0)
    }
}

fn check_window(size: usize) -> Result<(), ImageError> {
    if size == 0 {
        return Err(ImageError::InvalidWindow { size });
    }
    Ok(())
}

fn window_stat(
    img: &GrayImageView<'_>,
    window_size: usize,
    stat: impl Fn(&IntegralImage, &Window) -> f64 + Sync,
) -> Result<FloatImage, ImageError> {
    img.ensure_non_empty()?;
    check_window(window_size)?;

    let table = IntegralImage::new(img);
    let mut out = Image::filled(img.width, img.height, 0.0);
    for_each_row(&mut out.data, img.width, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            let w = Window::around(x, y, window_size, img.width, img.height);
            *v = stat(&table, &w);
        }
    });
    Ok(out)
}

/// Mean over the clipped window around every pixel.
pub fn window_mean(img: &GrayImageView<'_>, window_size: usize) -> Result<FloatImage, ImageError> {
    window_stat(img, window_size, IntegralImage::mean)
}

/// Population variance over the clipped window around every pixel.
pub fn window_variance(
    img: &GrayImageView<'_>,
    window_size: usize,
) -> Result<FloatImage, ImageError> {
    window_stat(img, window_size, IntegralImage::variance)
}

/// Sample covariance `Σ (a - mean_a[p]) (b - mean_b[p]) / (n - 1)` over the
/// clipped window around every pixel `p`. A one-pixel window yields 0.
pub fn window_covariance(
    a: &GrayImageView<'_>,
    b: &GrayImageView<'_>,
    mean_a: &FloatImage,
    mean_b: &FloatImage,
    window_size: usize,
) -> Result<FloatImage, ImageError> {
    a.ensure_non_empty()?;
    a.ensure_same_dims(b)?;
    a.ensure_same_dims(&mean_a.view())?;
    a.ensure_same_dims(&mean_b.view())?;
    check_window(window_size)?;

    let (width, height) = a.dims();
    let mut out = Image::filled(width, height, 0.0);
    for_each_row(&mut out.data, width, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            let w = Window::around(x, y, window_size, width, height);
            let n = w.area();
            if n <= 1 {
                continue;
            }
            let (ma, mb) = (mean_a.get(x, y), mean_b.get(x, y));
            let mut acc = 0.0;
            for yy in w.y0..w.y1 {
                let ra = &a.row(yy)[w.x0..w.x1];
                let rb = &b.row(yy)[w.x0..w.x1];
                for (&pa, &pb) in ra.iter().zip(rb) {
                    acc += (pa as f64 - ma) * (pb as f64 - mb);
                }
            }
            *v = acc / (n - 1) as f64;
        }
    });
    Ok(out)
}

/// Compare two equally sized images; returns the per-pixel map and its mean.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(w = a.width, h = a.height))
)]
pub fn structural_similarity(
    a: &GrayImageView<'_>,
    b: &GrayImageView<'_>,
    params: &SsimParams,
) -> Result<SsimMap, ImageError> {
    a.ensure_non_empty()?;
    a.ensure_same_dims(b)?;
    check_window(params.window_size)?;

    let ws = params.window_size;
    let ux = window_mean(a, ws)?;
    let uy = window_mean(b, ws)?;
    let vx = window_variance(a, ws)?;
    let vy = window_variance(b, ws)?;
    let vxy = window_covariance(a, b, &ux, &uy, ws)?;

    let (c1, c2) = (params.c1(), params.c2());
    let mut map = Image::filled(a.width, a.height, 0.0);
    for_each_row(&mut map.data, a.width, |y, row| {
        let base = y * a.width;
        for (x, s) in row.iter_mut().enumerate() {
            let i = base + x;
            let (mx, my) = (ux.data[i], uy.data[i]);
            *s = ((2.0 * mx * my + c1) * (2.0 * vxy.data[i] + c2))
                / ((mx * mx + my * my + c1) * (vx.data[i] + vy.data[i] + c2));
        }
    });

    let score = map.data.iter().sum::<f64>() / map.data.len() as f64;
    log::trace!("ssim score {score:.6} over {}x{}", a.width, a.height);
    Ok(SsimMap { map, score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn smooth(w: usize, h: usize) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| (100 + (x + y) / 4) as u8)
    }

    fn noisy(w: usize, h: usize, seed: u32) -> GrayImage {
        let mut s = seed;
        GrayImage::from_fn(w, h, |_, _| {
            s = s.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (s >> 24) as u8
        })
    }

    #[test]
    fn window_statistics_on_a_small_grid() {
        let img = GrayImage::from_fn(3, 3, |x, y| (3 * y + x) as u8);
        let mean = window_mean(&img.view(), 3).unwrap();
        assert_abs_diff_eq!(mean.get(0, 0), 2.0); // 0 1 3 4
        assert_abs_diff_eq!(mean.get(1, 1), 4.0);
        assert_abs_diff_eq!(mean.get(2, 2), 6.0); // 4 5 7 8

        let var = window_variance(&img.view(), 3).unwrap();
        assert_abs_diff_eq!(var.get(0, 0), 2.5, epsilon = 1e-12);

        let cov = window_covariance(&img.view(), &img.view(), &mean, &mean, 3).unwrap();
        assert_abs_diff_eq!(cov.get(0, 0), 10.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn integral_statistics_match_brute_force() {
        let img = noisy(23, 17, 7);
        let ws = 7;
        let mean = window_mean(&img.view(), ws).unwrap();
        let var = window_variance(&img.view(), ws).unwrap();

        for y in 0..img.height {
            for x in 0..img.width {
                let w = Window::around(x, y, ws, img.width, img.height);
                let vals: Vec<f64> = (w.y0..w.y1)
                    .flat_map(|yy| (w.x0..w.x1).map(move |xx| (xx, yy)))
                    .map(|(xx, yy)| img.get(xx, yy) as f64)
                    .collect();
                let n = vals.len() as f64;
                let m = vals.iter().sum::<f64>() / n;
                let v = vals.iter().map(|a| (a - m) * (a - m)).sum::<f64>() / n;
                assert_abs_diff_eq!(mean.get(x, y), m, epsilon = 1e-9);
                assert_abs_diff_eq!(var.get(x, y), v, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn windows_are_clipped_not_padded() {
        assert_eq!(
            Window::around(0, 0, 7, 10, 10),
            Window {
                x0: 0,
                x1: 4,
                y0: 0,
                y1: 4
            }
        );
        assert_eq!(Window::around(9, 5, 7, 10, 10).x1, 10);
        assert_eq!(Window::around(5, 5, 7, 10, 10).area(), 49);
    }

    #[test]
    fn identical_flat_images_score_one() {
        let img = GrayImage::filled(20, 20, 90);
        let res = structural_similarity(&img.view(), &img.view(), &SsimParams::default()).unwrap();
        for &s in &res.map.data {
            assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(res.score, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn identical_smooth_images_score_one() {
        let img = smooth(40, 30);
        let res = structural_similarity(&img.view(), &img.view(), &SsimParams::default()).unwrap();
        for y in 3..27 {
            for x in 3..37 {
                assert_abs_diff_eq!(res.map.get(x, y), 1.0, epsilon = 1e-3);
            }
        }
        assert_abs_diff_eq!(res.score, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn identical_textured_images_stay_within_sample_bias() {
        let img = noisy(32, 32, 3);
        let res = structural_similarity(&img.view(), &img.view(), &SsimParams::default()).unwrap();
        for y in 3..29 {
            for x in 3..29 {
                let s = res.map.get(x, y);
                assert!(s >= 1.0 - 1e-12 && s <= 49.0 / 48.0 + 1e-12, "ssim {s}");
            }
        }
    }

    #[test]
    fn inverted_structure_scores_negative() {
        let a = GrayImage::from_fn(24, 24, |x, _| if x % 2 == 0 { 0 } else { 255 });
        let b = GrayImage::from_fn(24, 24, |x, _| if x % 2 == 0 { 255 } else { 0 });
        let res = structural_similarity(&a.view(), &b.view(), &SsimParams::default()).unwrap();
        assert!(res.score < 0.0, "score {}", res.score);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let a = GrayImage::filled(8, 8, 0);
        let b = GrayImage::filled(8, 9, 0);
        assert_eq!(
            structural_similarity(&a.view(), &b.view(), &SsimParams::default()),
            Err(ImageError::DimensionMismatch {
                expected: (8, 8),
                actual: (8, 9)
            })
        );
        let params = SsimParams {
            window_size: 0,
            ..SsimParams::default()
        };
        assert_eq!(
            structural_similarity(&a.view(), &a.view(), &params),
            Err(ImageError::InvalidWindow { size: 0 })
        );
        let empty = GrayImage::filled(0, 0, 0);
        assert_eq!(
            structural_similarity(&empty.view(), &empty.view(), &SsimParams::default()),
            Err(ImageError::EmptyImage)
        );
    }

    #[test]
    fn single_pixel_windows_have_zero_covariance() {
        let img = GrayImage::from_vec(1, 1, vec![200]).unwrap();
        let mean = window_mean(&img.view(), 1).unwrap();
        let cov = window_covariance(&img.view(), &img.view(), &mean, &mean, 1).unwrap();
        assert_eq!(cov.data, vec![0.0]);
    }

    #[test]
    fn map_scales_to_truncated_bytes() {
        let res = SsimMap {
            map: FloatImage::from_vec(4, 1, vec![-0.5, 0.5, 1.0, 1.2]).unwrap(),
            score: 0.55,
        };
        assert_eq!(res.to_gray().data, vec![0, 127, 255, 255]);
    }

    #[test]
    fn constants_follow_dynamic_range() {
        let p = SsimParams::default();
        assert_abs_diff_eq!(p.c1(), 6.5025, epsilon = 1e-12);
        assert_abs_diff_eq!(p.c2(), 58.5225, epsilon = 1e-12);
    }
}
