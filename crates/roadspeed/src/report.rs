use roadspeed_tracker::Track;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Outcome of one processed frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// 0-based index among the processed frames; the baseline is not counted.
    pub frame_index: u64,
    /// Mean SSIM of the rectified frame against the baseline.
    pub ssim_score: f64,
    /// Foreground pixels left after morphological cleanup.
    pub foreground_pixels: usize,
    /// Regions extracted before the tracker's filters.
    pub blob_count: usize,
    pub tracks: Vec<Track>,
}

/// Totals of a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub frames: u64,
    pub tracks_created: u64,
}

/// Append `report` as one line of JSON.
pub fn write_json_line<W: Write>(writer: &mut W, report: &FrameReport) -> Result<(), serde_json::Error> {
    serde_json::to_writer(&mut *writer, report)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)
}
