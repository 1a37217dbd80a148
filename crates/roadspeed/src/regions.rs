//! Blob extraction from binary foreground masks.
//!
//! [`ContourExtractor`] runs `imageproc`'s border following over the mask and
//! keeps the outermost borders only: holes, and anything drawn inside a hole,
//! belong to the enclosing blob.

use crate::interop::to_image_gray;
use imageproc::contours::{find_contours, BorderType, Contour};
use nalgebra::Point2;
use roadspeed_core::{Blob, BoundingBox, GrayImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Turns a binary mask into candidate blobs.
pub trait RegionExtractor {
    /// Non-zero pixels are foreground. Blobs are returned in a deterministic
    /// order for a given mask.
    fn extract(&self, mask: &GrayImageView<'_>) -> Vec<Blob>;
}

/// How much of the traced boundary is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainApprox {
    /// Every boundary pixel.
    None,
    /// Only the pixels where the boundary changes direction.
    #[default]
    Simple,
}

/// 8-connected components with their outer boundaries, in raster order of
/// their first pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContourExtractor {
    pub approximation: ChainApprox,
}

impl ContourExtractor {
    pub fn new(approximation: ChainApprox) -> Self {
        Self { approximation }
    }

    fn to_blob(&self, contour: Contour<i32>) -> Option<Blob> {
        let boundary: Vec<Point2<i32>> = contour
            .points
            .iter()
            .map(|p| Point2::new(p.x, p.y))
            .collect();
        let first = boundary.first()?;
        let (min, max) = boundary.iter().fold((*first, *first), |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        });
        let bbox = BoundingBox::new(min.x, min.y, max.x - min.x + 1, max.y - min.y + 1);
        let boundary = match self.approximation {
            ChainApprox::None => boundary,
            ChainApprox::Simple => compress(&boundary),
        };
        Some(Blob::new(bbox, boundary))
    }
}

impl RegionExtractor for ContourExtractor {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(w = mask.width, h = mask.height))
    )]
    fn extract(&self, mask: &GrayImageView<'_>) -> Vec<Blob> {
        if mask.is_empty() {
            return Vec::new();
        }
        let blobs: Vec<Blob> = find_contours::<i32>(&to_image_gray(mask))
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .filter_map(|c| self.to_blob(c))
            .collect();
        log::trace!("extracted {} blobs", blobs.len());
        blobs
    }
}

/// Drop boundary pixels where the chain keeps its direction.
fn compress(points: &[Point2<i32>]) -> Vec<Point2<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let kept: Vec<_> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            points[i] - prev != next - points[i]
        })
        .map(|i| points[i])
        .collect();
    if kept.is_empty() {
        points[..1].to_vec()
    } else {
        kept
    }
}
