//! JSON configuration of a pipeline run.
//!
//! Every field has a default, so a partial document (or `{}`) is valid and
//! reproduces the reference camera setup.

use crate::regions::ChainApprox;
use nalgebra::Point2;
use roadspeed_core::{
    homography_from_correspondences, CorrespondenceSet, Homography, HomographyError, ImageError,
    SsimParams, StructuringElement,
};
use roadspeed_tracker::TrackerParams;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Bird's-eye region of interest and where its corners lie in the camera frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub width: usize,
    pub height: usize,
    /// Frame pixels of the ROI corners, ordered top-left, top-right,
    /// bottom-left, bottom-right.
    pub frame_corners: [[f64; 2]; 4],
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            frame_corners: [
                [629.0, 361.0],
                [1066.0, 411.0],
                [396.0, 486.0],
                [946.0, 571.0],
            ],
        }
    }
}

impl RoiConfig {
    /// ROI corner pixels in the same order as `frame_corners`.
    pub fn roi_corners(&self) -> [Point2<f64>; 4] {
        let r = self.width.saturating_sub(1) as f64;
        let b = self.height.saturating_sub(1) as f64;
        [
            Point2::new(0.0, 0.0),
            Point2::new(r, 0.0),
            Point2::new(0.0, b),
            Point2::new(r, b),
        ]
    }

    /// ROI corner to frame corner pairs.
    pub fn correspondences(&self) -> Result<CorrespondenceSet, HomographyError> {
        let to = self.frame_corners.map(|[x, y]| Point2::new(x, y));
        CorrespondenceSet::from_points(self.roi_corners(), to)
    }

    /// Homography taking ROI pixels to frame pixels; this is the mapping the
    /// warper samples through.
    pub fn frame_from_roi(&self) -> Result<Homography, HomographyError> {
        homography_from_correspondences(&self.correspondences()?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Odd side of the median filter; 1 disables blurring.
    pub median_kernel: usize,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self { median_kernel: 11 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyParams {
    pub element_width: usize,
    pub element_height: usize,
    pub iterations: usize,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self {
            element_width: 3,
            element_height: 3,
            iterations: 3,
        }
    }
}

impl MorphologyParams {
    /// All-ones rectangle of the configured size.
    pub fn element(&self) -> Result<StructuringElement, ImageError> {
        StructuringElement::rect(self.element_width, self.element_height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorParams {
    pub approximation: ChainApprox,
}

/// Complete configuration of a [`crate::Pipeline`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub roi: RoiConfig,
    pub preprocess: PreprocessParams,
    pub ssim: SsimParams,
    /// Pixels of the 8-bit dissimilarity map below this level are foreground.
    pub threshold: u8,
    pub morphology: MorphologyParams,
    pub extractor: ExtractorParams,
    pub tracker: TrackerParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roi: RoiConfig::default(),
            preprocess: PreprocessParams::default(),
            ssim: SsimParams::default(),
            threshold: 164,
            morphology: MorphologyParams::default(),
            extractor: ExtractorParams::default(),
            tracker: TrackerParams::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_json(path, self)
    }
}

/// Deserialize any JSON document from a file.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Serialize to a pretty-printed JSON file, replacing it if present.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), ConfigError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_document_is_the_reference_setup() {
        let cfg: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.threshold, 164);
        assert_eq!(cfg.preprocess.median_kernel, 11);
        assert_eq!(cfg.ssim.window_size, 7);
        assert_eq!(cfg.extractor.approximation, ChainApprox::Simple);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{ "threshold": 120, "morphology": { "iterations": 1 }, "extractor": { "approximation": "none" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.threshold, 120);
        assert_eq!(cfg.morphology.iterations, 1);
        assert_eq!(cfg.morphology.element_width, 3);
        assert_eq!(cfg.extractor.approximation, ChainApprox::None);
        assert_eq!(cfg.roi, RoiConfig::default());
    }

    #[test]
    fn default_roi_maps_corners_onto_the_frame() {
        let roi = RoiConfig::default();
        let h = roi.frame_from_roi().unwrap();
        for (from, to) in roi.roi_corners().iter().zip(roi.frame_corners) {
            let p = h.apply(*from);
            assert_abs_diff_eq!(p.x, to[0], epsilon = 1e-6);
            assert_abs_diff_eq!(p.y, to[1], epsilon = 1e-6);
        }
    }

    #[test]
    fn collinear_frame_corners_are_rejected() {
        let roi = RoiConfig {
            frame_corners: [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [10.0, 10.0]],
            ..RoiConfig::default()
        };
        assert!(roi.frame_from_roi().is_err());
    }

    #[test]
    fn morphology_element_follows_config() {
        let params = MorphologyParams {
            element_width: 7,
            element_height: 5,
            iterations: 2,
        };
        let se = params.element().unwrap();
        assert_eq!((se.width(), se.height()), (7, 5));
    }
}
