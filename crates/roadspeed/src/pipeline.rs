//! End-to-end driver: rectify, compare with the baseline, segment, track.
//!
//! The first frame of a run is the empty-road baseline. Every later frame is
//! warped into the bird's-eye ROI, converted to gray and blurred, compared
//! with the baseline through SSIM, thresholded, cleaned by opening, split
//! into blobs and handed to the tracker.

use crate::{
    config::PipelineConfig,
    preprocess::{median_blur, rgb_to_gray},
    regions::{ContourExtractor, RegionExtractor},
    report::{FrameReport, RunSummary},
};
use roadspeed_core::{
    inverse_threshold, opening, structural_similarity, warp_perspective, GrayImage, Homography,
    HomographyError, ImageError, RgbImage, StructuringElement,
};
use roadspeed_tracker::Tracker;
use std::convert::Infallible;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Homography(#[from] HomographyError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("frame source yielded no baseline frame")]
    EmptySource,
    #[error("frame source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("report sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Ordered supply of RGB frames.
pub trait FrameSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, Self::Error>;
}

/// Frames from any in-memory iterator.
#[derive(Clone, Debug)]
pub struct IterFrameSource<I> {
    iter: I,
}

impl<I> IterFrameSource<I>
where
    I: Iterator<Item = RgbImage>,
{
    pub fn new(frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: frames.into_iter(),
        }
    }
}

impl<I> FrameSource for IterFrameSource<I>
where
    I: Iterator<Item = RgbImage>,
{
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<RgbImage>, Infallible> {
        Ok(self.iter.next())
    }
}

/// Intermediate images of one frame, before region extraction.
#[derive(Clone, Debug)]
pub struct FrameStages {
    /// Rectified, gray, blurred ROI.
    pub roi: GrayImage,
    pub ssim_score: f64,
    /// SSIM map scaled to 8 bit.
    pub similarity: GrayImage,
    /// Thresholded dissimilarity mask.
    pub mask: GrayImage,
    /// Mask after opening.
    pub cleaned: GrayImage,
}

/// Stateful run over one camera sequence.
#[derive(Debug)]
pub struct Pipeline<E = ContourExtractor> {
    config: PipelineConfig,
    frame_from_roi: Homography,
    element: StructuringElement,
    frame_dims: (usize, usize),
    baseline: GrayImage,
    extractor: E,
    tracker: Tracker,
    frames: u64,
}

impl Pipeline<ContourExtractor> {
    /// Build a pipeline around `baseline`, a frame of the empty road.
    pub fn new(config: PipelineConfig, baseline: &RgbImage) -> Result<Self, PipelineError> {
        let extractor = ContourExtractor::new(config.extractor.approximation);
        Self::with_extractor(config, baseline, extractor)
    }

    /// Take the first frame of `source` as the baseline.
    pub fn from_source<S: FrameSource>(
        config: PipelineConfig,
        source: &mut S,
    ) -> Result<Self, PipelineError> {
        let baseline = source
            .next_frame()
            .map_err(|e| PipelineError::Source(Box::new(e)))?
            .ok_or(PipelineError::EmptySource)?;
        Self::new(config, &baseline)
    }
}

impl<E: RegionExtractor> Pipeline<E> {
    pub fn with_extractor(
        config: PipelineConfig,
        baseline: &RgbImage,
        extractor: E,
    ) -> Result<Self, PipelineError> {
        if baseline.is_empty() {
            return Err(ImageError::EmptyImage.into());
        }
        let frame_from_roi = config.roi.frame_from_roi()?;
        let element = config.morphology.element()?;
        let baseline_roi = prepare(&config, &frame_from_roi, baseline)?;
        if config.threshold == 0 {
            log::warn!("threshold 0 marks no pixel as foreground");
        }
        log::info!(
            "baseline {}x{} frame, {}x{} roi",
            baseline.width,
            baseline.height,
            config.roi.width,
            config.roi.height
        );
        Ok(Self {
            tracker: Tracker::new(config.tracker),
            frame_from_roi,
            element,
            frame_dims: baseline.dims(),
            baseline: baseline_roi,
            extractor,
            config,
            frames: 0,
        })
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Mapping from ROI pixels to frame pixels.
    #[inline]
    pub fn homography(&self) -> &Homography {
        &self.frame_from_roi
    }

    /// Preprocessed ROI of the baseline frame.
    #[inline]
    pub fn baseline(&self) -> &GrayImage {
        &self.baseline
    }

    #[inline]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Warp a frame into the bird's-eye ROI without further processing.
    pub fn rectify(&self, frame: &RgbImage) -> RgbImage {
        warp_perspective(
            &frame.view(),
            &self.frame_from_roi,
            self.config.roi.width,
            self.config.roi.height,
            [0, 0, 0],
        )
    }

    /// Run every stage up to the cleaned mask. Does not touch the tracker.
    pub fn analyze(&self, frame: &RgbImage) -> Result<FrameStages, PipelineError> {
        if frame.dims() != self.frame_dims {
            return Err(ImageError::DimensionMismatch {
                expected: self.frame_dims,
                actual: frame.dims(),
            }
            .into());
        }
        let roi = prepare(&self.config, &self.frame_from_roi, frame)?;
        let ssim = structural_similarity(&self.baseline.view(), &roi.view(), &self.config.ssim)?;
        let similarity = ssim.to_gray();
        let mask = inverse_threshold(&similarity.view(), self.config.threshold);
        let cleaned = opening(
            &mask.view(),
            &self.element,
            self.config.morphology.iterations,
        )?;
        Ok(FrameStages {
            roi,
            ssim_score: ssim.score,
            similarity,
            mask,
            cleaned,
        })
    }

    /// Analyze a frame, extract its blobs and advance the tracker.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(frame = self.frames))
    )]
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<FrameReport, PipelineError> {
        let stages = self.analyze(frame)?;
        let blobs = self.extractor.extract(&stages.cleaned.view());
        let tracks = self.tracker.step(&blobs).to_vec();

        let report = FrameReport {
            frame_index: self.frames,
            ssim_score: stages.ssim_score,
            foreground_pixels: stages.cleaned.count_nonzero(),
            blob_count: blobs.len(),
            tracks,
        };
        log::debug!(
            "frame {}: ssim {:.4}, {} blobs, {} tracks",
            report.frame_index,
            report.ssim_score,
            report.blob_count,
            report.tracks.len()
        );
        self.frames += 1;
        Ok(report)
    }

    /// Process every remaining frame of `source`, handing each report to
    /// `on_report` in order.
    pub fn run<S, F, Er>(&mut self, source: &mut S, mut on_report: F) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource,
        F: FnMut(&FrameReport) -> Result<(), Er>,
        Er: std::error::Error + Send + Sync + 'static,
    {
        let first_frame = self.frames;
        let first_id = self.tracker.next_id();
        while let Some(frame) = source
            .next_frame()
            .map_err(|e| PipelineError::Source(Box::new(e)))?
        {
            let report = self.process_frame(&frame)?;
            on_report(&report).map_err(|e| PipelineError::Sink(Box::new(e)))?;
        }
        let summary = RunSummary {
            frames: self.frames - first_frame,
            tracks_created: self.tracker.next_id() - first_id,
        };
        log::info!(
            "processed {} frames, {} tracks created",
            summary.frames,
            summary.tracks_created
        );
        Ok(summary)
    }

    /// [`Pipeline::run`] collecting the reports.
    pub fn run_collect<S: FrameSource>(
        &mut self,
        source: &mut S,
    ) -> Result<Vec<FrameReport>, PipelineError> {
        let mut reports = Vec::new();
        self.run(source, |r| {
            reports.push(r.clone());
            Ok::<(), Infallible>(())
        })?;
        Ok(reports)
    }
}

/// Rectify, convert to gray and blur one frame.
fn prepare(
    config: &PipelineConfig,
    frame_from_roi: &Homography,
    frame: &RgbImage,
) -> Result<GrayImage, PipelineError> {
    let rectified = warp_perspective(
        &frame.view(),
        frame_from_roi,
        config.roi.width,
        config.roi.height,
        [0, 0, 0],
    );
    let gray = rgb_to_gray(&rectified.view());
    Ok(median_blur(&gray.view(), config.preprocess.median_kernel)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoiConfig;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            roi: RoiConfig {
                width: 40,
                height: 30,
                frame_corners: [[10.0, 5.0], [49.0, 5.0], [10.0, 34.0], [49.0, 34.0]],
            },
            preprocess: crate::PreprocessParams { median_kernel: 3 },
            ..PipelineConfig::default()
        }
    }

    fn frame(v: u8) -> RgbImage {
        RgbImage::filled(64, 48, [v, v, v])
    }

    #[test]
    fn rectify_produces_the_roi_size() {
        let p = Pipeline::new(small_config(), &frame(90)).unwrap();
        let roi = p.rectify(&frame(90));
        assert_eq!(roi.dims(), (40, 30));
        assert!(roi.data.iter().all(|&px| px == [90, 90, 90]));
    }

    #[test]
    fn frame_size_must_match_the_baseline() {
        let mut p = Pipeline::new(small_config(), &frame(90)).unwrap();
        let err = p.process_frame(&RgbImage::filled(32, 32, [0; 3])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Image(ImageError::DimensionMismatch {
                expected: (64, 48),
                actual: (32, 32)
            })
        ));
    }

    #[test]
    fn empty_source_has_no_baseline() {
        let mut src = IterFrameSource::new(Vec::<RgbImage>::new());
        assert!(matches!(
            Pipeline::from_source(small_config(), &mut src),
            Err(PipelineError::EmptySource)
        ));
    }

    #[test]
    fn even_median_kernel_is_reported() {
        let mut cfg = small_config();
        cfg.preprocess.median_kernel = 4;
        assert!(matches!(
            Pipeline::new(cfg, &frame(90)),
            Err(PipelineError::Image(ImageError::InvalidWindow { size: 4 }))
        ));
    }

    #[test]
    fn degenerate_roi_is_reported() {
        let mut cfg = small_config();
        cfg.roi.frame_corners = [[0.0, 0.0]; 4];
        assert!(matches!(
            Pipeline::new(cfg, &frame(90)),
            Err(PipelineError::Homography(_))
        ));
    }

    #[test]
    fn frame_indices_count_processed_frames() {
        let mut src = IterFrameSource::new(vec![frame(90), frame(90), frame(90)]);
        let mut p = Pipeline::from_source(small_config(), &mut src).unwrap();
        let reports = p.run_collect(&mut src).unwrap();
        let idx: Vec<_> = reports.iter().map(|r| r.frame_index).collect();
        assert_eq!(idx, vec![0, 1]);
    }
}
