//! Lightweight vehicle tracker for rectified (bird's-eye) traffic scenes.
//!
//! Design idea:
//! - blobs from one frame are gated against the tracks of the previous frame,
//! - a match inherits the track identity and updates its speed estimate from
//!   the vertical centroid displacement,
//! - unmatched blobs start new tracks, unmatched tracks are dropped at once.
//!
//! There is no motion model and no coasting through missed detections.

mod params;
mod track;
mod tracker;

pub use params::{AssociationGate, SpeedCalibration, TrackerParams};
pub use track::{Speed, Track};
pub use tracker::Tracker;
