use serde::{Deserialize, Serialize};

/// Maximum per-axis centroid displacement (ROI pixels) between two frames for
/// a blob to continue an existing track.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationGate {
    pub max_dx: f64,
    pub max_dy: f64,
}

impl Default for AssociationGate {
    fn default() -> Self {
        Self {
            max_dx: 10.0,
            max_dy: 30.0,
        }
    }
}

impl AssociationGate {
    #[inline]
    pub fn admits(&self, dx: f64, dy: f64) -> bool {
        dx.abs() <= self.max_dx && dy.abs() <= self.max_dy
    }
}

/// Conversion from ROI displacement per frame to km/h.
///
/// The factor bakes in both the ground scale of the ROI and the capture frame
/// rate; footage with a different frame rate needs a different factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedCalibration {
    pub kmh_per_px: f64,
}

impl Default for SpeedCalibration {
    fn default() -> Self {
        Self { kmh_per_px: 9.0 }
    }
}

impl SpeedCalibration {
    /// Derive the factor from the ground length of one ROI pixel and the
    /// capture frame rate: `m/px · frames/s · 3.6`.
    pub fn from_ground_scale(metres_per_px: f64, fps: f64) -> Self {
        Self {
            kmh_per_px: metres_per_px * fps * 3.6,
        }
    }

    #[inline]
    pub fn speed_kmh(&self, px_per_frame: f64) -> f64 {
        px_per_frame * self.kmh_per_px
    }
}

/// Tracker configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Blobs whose bounding-box area is not above this are ignored.
    pub min_area: i64,
    pub gate: AssociationGate,
    pub calibration: SpeedCalibration,
    /// Weight of the new measurement when blending with a measured speed.
    /// 0.5 is the plain average of the two.
    pub smoothing: f64,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            min_area: 1200,
            gate: AssociationGate::default(),
            calibration: SpeedCalibration::default(),
            smoothing: 0.5,
        }
    }
}
