use crate::{Speed, Track, TrackerParams};
use nalgebra::Point2;
use roadspeed_core::Blob;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Owns the live track set and the identity counter of one pipeline run.
#[derive(Clone, Debug)]
pub struct Tracker {
    params: TrackerParams,
    tracks: Vec<Track>,
    next_id: u64,
    frame_index: u64,
}

impl Tracker {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            tracks: Vec::new(),
            next_id: 0,
            frame_index: 0,
        }
    }

    #[inline]
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Tracks produced by the last step.
    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Identity the next new track will receive.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Number of steps taken since construction or the last reset.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Forget every track and restart identities at 0.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 0;
        self.frame_index = 0;
    }

    /// Associate the blobs of the current frame with the previous tracks.
    ///
    /// Every (blob, previous track) pair inside the gate is a candidate; the
    /// candidates are granted nearest first, each blob and each previous track
    /// at most once. Equal distances go to the earlier track, then the earlier
    /// blob, so identities are reproducible for identical input. Unmatched
    /// blobs open new tracks in input order. The returned set, in blob order,
    /// replaces the previous one entirely.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(frame = self.frame_index, blobs = blobs.len()))
    )]
    pub fn step(&mut self, blobs: &[Blob]) -> &[Track] {
        let previous = std::mem::take(&mut self.tracks);

        let mut candidates: Vec<(usize, Point2<f64>)> = Vec::with_capacity(blobs.len());
        for (i, blob) in blobs.iter().enumerate() {
            if blob.bbox.is_degenerate() || blob.bbox.area() <= self.params.min_area {
                continue;
            }
            match blob.centroid() {
                Some(c) => candidates.push((i, c)),
                None => log::warn!(
                    "skipping blob at {:?} without boundary points",
                    blob.bbox.top_left()
                ),
            }
        }

        let assignment = self.assign(&previous, &candidates);

        let mut current = Vec::with_capacity(candidates.len());
        for (&(i, centroid), matched) in candidates.iter().zip(&assignment) {
            let bbox = blobs[i].bbox;
            let track = match *matched {
                Some(t) => {
                    let prior = &previous[t];
                    let instant = self
                        .params
                        .calibration
                        .speed_kmh((centroid.y - prior.centroid.y).abs());
                    let speed = prior.speed.update(instant, self.params.smoothing);
                    log::trace!(
                        "track {} moved to ({:.1}, {:.1}), speed {:?}",
                        prior.id,
                        centroid.x,
                        centroid.y,
                        speed
                    );
                    Track {
                        id: prior.id,
                        centroid,
                        bbox,
                        speed,
                    }
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    log::debug!(
                        "new track {id} at ({:.1}, {:.1})",
                        centroid.x,
                        centroid.y
                    );
                    Track {
                        id,
                        centroid,
                        bbox,
                        speed: Speed::Unknown,
                    }
                }
            };
            current.push(track);
        }

        for (t, prior) in previous.iter().enumerate() {
            if !assignment.contains(&Some(t)) {
                log::debug!("track {} lost", prior.id);
            }
        }

        self.tracks = current;
        self.frame_index += 1;
        &self.tracks
    }

    /// For each candidate blob, the index of the previous track it continues.
    fn assign(&self, previous: &[Track], candidates: &[(usize, Point2<f64>)]) -> Vec<Option<usize>> {
        let mut pairs = Vec::new();
        for (b, &(_, c)) in candidates.iter().enumerate() {
            for (t, prior) in previous.iter().enumerate() {
                let d = c - prior.centroid;
                if self.params.gate.admits(d.x, d.y) {
                    pairs.push((d.norm(), t, b));
                }
            }
        }
        pairs.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

        let mut assignment = vec![None; candidates.len()];
        let mut taken = vec![false; previous.len()];
        for (_, t, b) in pairs {
            if taken[t] || assignment[b].is_some() {
                continue;
            }
            taken[t] = true;
            assignment[b] = Some(t);
        }
        assignment
    }
}
