//! High-level facade for the `roadspeed-*` workspace.
//!
//! This crate provides:
//! - re-exports of the numeric core (`roadspeed::core`) and the tracker
//!   (`roadspeed::tracker`),
//! - reference implementations of the stages around the core: grayscale
//!   conversion and median blur, connected-component region extraction,
//! - the [`Pipeline`] driver with JSON configuration and per-frame reports,
//! - a frame source reading a directory of images, and (feature `cli`) the
//!   `roadspeed` binary.
//!
//! ## Quickstart
//!
//! ```no_run
//! use roadspeed::{ImageDirSource, Pipeline, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load_json("roadspeed.json")?;
//! let mut frames = ImageDirSource::open("frames/")?;
//! // the first frame is the empty-road baseline
//! let mut pipeline = Pipeline::from_source(config, &mut frames)?;
//! let reports = pipeline.run_collect(&mut frames)?;
//! for r in &reports {
//!     println!("frame {}: {} vehicles", r.frame_index, r.tracks.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `roadspeed::core`: images, homography, warp, SSIM, morphology, threshold.
//! - `roadspeed::tracker`: vehicle tracker and speed calibration.
//! - [`preprocess`]: grayscale conversion and median blur.
//! - [`interop`]: conversions to and from `image` buffers.
//! - [`regions`]: blob extraction from binary masks.
//! - [`Pipeline`], [`PipelineConfig`], [`FrameReport`]: the end-to-end driver.

pub use roadspeed_core as core;
pub use roadspeed_tracker as tracker;

pub mod config;
pub mod frames;
pub mod interop;
pub mod pipeline;
pub mod preprocess;
pub mod regions;
pub mod report;

pub use config::{
    ConfigError, ExtractorParams, MorphologyParams, PipelineConfig, PreprocessParams, RoiConfig,
};
pub use pipeline::{FrameSource, FrameStages, IterFrameSource, Pipeline, PipelineError};
pub use regions::{ChainApprox, ContourExtractor, RegionExtractor};
pub use report::{write_json_line, FrameReport, RunSummary};
pub use roadspeed_tracker::{Speed, Track, Tracker, TrackerParams};
pub use frames::{FrameError, ImageDirSource};
