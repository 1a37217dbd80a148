use nalgebra::Point2;
use roadspeed_core::BoundingBox;
use serde::{Deserialize, Serialize};

/// Speed estimate of a track, in km/h.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "kmh", rename_all = "snake_case")]
pub enum Speed {
    /// No non-zero displacement observed yet.
    #[default]
    Unknown,
    Measured(f64),
}

impl Speed {
    #[inline]
    pub fn kmh(&self) -> Option<f64> {
        match *self {
            Speed::Unknown => None,
            Speed::Measured(v) => Some(v),
        }
    }

    /// Fold an instantaneous measurement into this estimate.
    ///
    /// An unknown speed adopts the first non-zero measurement; a measured
    /// speed is blended as `weight · instant + (1 - weight) · previous`.
    pub fn update(self, instant: f64, weight: f64) -> Speed {
        match self {
            Speed::Unknown if instant > 0.0 => Speed::Measured(instant),
            Speed::Unknown => Speed::Unknown,
            Speed::Measured(prev) => Speed::Measured(weight * instant + (1.0 - weight) * prev),
        }
    }
}

/// A vehicle observed in the current frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub centroid: Point2<f64>,
    pub bbox: BoundingBox,
    pub speed: Speed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_waits_for_motion() {
        assert_eq!(Speed::Unknown.update(0.0, 0.5), Speed::Unknown);
        assert_eq!(Speed::Unknown.update(27.0, 0.5), Speed::Measured(27.0));
    }

    #[test]
    fn measured_speed_is_averaged() {
        assert_eq!(Speed::Measured(40.0).update(20.0, 0.5), Speed::Measured(30.0));
        // a stalled frame still pulls the estimate down
        assert_eq!(Speed::Measured(40.0).update(0.0, 0.5), Speed::Measured(20.0));
    }

    #[test]
    fn serializes_with_explicit_state() {
        let json = serde_json::to_string(&Speed::Measured(45.0)).unwrap();
        assert_eq!(json, r#"{"state":"measured","kmh":45.0}"#);
        let json = serde_json::to_string(&Speed::Unknown).unwrap();
        assert_eq!(json, r#"{"state":"unknown"}"#);
    }
}
