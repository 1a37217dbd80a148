//! Frames read from image files.

use crate::pipeline::FrameSource;
use crate::interop::from_image_rgb;
use roadspeed_core::RgbImage;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("failed to read frames: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode frame: {0}")]
    Decode(#[from] image::ImageError),
}

/// Every decodable image file of a directory, in file-name order.
#[derive(Clone, Debug)]
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    /// List `dir`, keeping files whose extension names an image format.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FrameError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("{} frames in {}", paths.len(), dir.as_ref().display());
        Ok(Self { paths, next: 0 })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Frames not yet yielded.
    pub fn remaining(&self) -> usize {
        self.paths.len() - self.next
    }
}

impl FrameSource for ImageDirSource {
    type Error = FrameError;

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        log::trace!("loading {}", path.display());
        load_rgb(path).map(Some)
    }
}

/// Decode any supported image file to RGB.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, FrameError> {
    let img = image::ImageReader::open(path)?.decode()?.to_rgb8();
    Ok(from_image_rgb(&img))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_frame(dir: &Path, name: &str, v: u8) {
        image::RgbImage::from_pixel(6, 4, image::Rgb([v, v / 2, 0]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn frames_come_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "frame_002.png", 20);
        write_frame(dir.path(), "frame_001.png", 10);
        write_frame(dir.path(), "frame_010.png", 30);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut src = ImageDirSource::open(dir.path()).unwrap();
        assert_eq!(src.remaining(), 3);
        let firsts: Vec<_> = std::iter::from_fn(|| src.next_frame().unwrap())
            .map(|f| f.get(0, 0))
            .collect();
        assert_eq!(firsts, vec![[10, 5, 0], [20, 10, 0], [30, 15, 0]]);
    }

    #[test]
    fn undecodable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"nope").unwrap();
        let mut src = ImageDirSource::open(dir.path()).unwrap();
        assert!(matches!(src.next_frame(), Err(FrameError::Decode(_))));
    }
}
