//! Core image geometry and change-detection passes for fixed-camera traffic scenes.
//!
//! The crate is purely numeric: it rectifies a frame into a bird's-eye region of
//! interest, compares it against an empty-scene baseline with a windowed SSIM
//! statistic, and cleans the resulting binary mask with morphology. It does *not*
//! decode video, render overlays or extract contours.
//!
//! Every full-image pass returns a freshly materialized image. With the `rayon`
//! feature (on by default) the rows of a single pass are processed in parallel.

mod blob;
mod centroid;
mod error;
mod homography;
mod image;
mod logger;
mod morphology;
mod rows;
mod ssim;
mod threshold;
mod warp;

pub use blob::{Blob, BoundingBox};
pub use centroid::boundary_centroid;
pub use error::{Degeneracy, HomographyError, ImageError};
pub use homography::{
    homography_from_correspondences, Correspondence, CorrespondenceSet, Homography,
};
pub use image::{FloatImage, GrayImage, GrayImageView, Image, ImageView, RgbImage};
pub use morphology::{
    closing, dilate, erode, opening, StructuringElement, BACKGROUND, FOREGROUND,
};
pub use ssim::{
    structural_similarity, window_covariance, window_mean, window_variance, SsimMap, SsimParams,
};
pub use threshold::inverse_threshold;
pub use warp::{warp_perspective, warp_perspective_into};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
