//! Per-camera image directories with sequential file numbering.
//!
//! Camera `i` (0-based) writes into `<root>/camera<i+1>`. The next file number
//! is the number of entries already in that directory, so each camera is
//! numbered independently and nothing is persisted between sessions.

use crate::source::{CaptureError, FrameData};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of saved frames; the encoder is picked from it.
pub const IMAGE_EXTENSION: &str = "png";

/// Output directories for captured frame sets.
#[derive(Debug, Clone)]
pub struct FrameStore {
    root: PathBuf,
}

impl FrameStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for the camera at `index` (0-based).
    pub fn camera_dir(&self, index: usize) -> PathBuf {
        self.root.join(format!("camera{}", index + 1))
    }

    /// Wipe and recreate empty directories for `num_cameras` cameras.
    pub fn regenerate(&self, num_cameras: usize) -> Result<(), CaptureError> {
        for index in 0..num_cameras {
            let dir = self.camera_dir(index);
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
            }
            fs::create_dir_all(&dir)?;
        }
        info!(
            "Regenerated {} camera folders under {}",
            num_cameras,
            self.root.display()
        );
        Ok(())
    }

    /// Make sure the camera directories exist, keeping anything already saved.
    pub fn prepare(&self, num_cameras: usize) -> Result<(), CaptureError> {
        for index in 0..num_cameras {
            fs::create_dir_all(self.camera_dir(index))?;
        }
        Ok(())
    }

    /// Number the next file in `dir` would get.
    pub fn next_index(dir: &Path) -> Result<usize, CaptureError> {
        Ok(fs::read_dir(dir)?.count())
    }

    /// Save one frame per camera, frame `i` into camera directory `i`.
    ///
    /// Returns the written paths in camera order.
    pub fn save(&self, frames: &[FrameData]) -> Result<Vec<PathBuf>, CaptureError> {
        let mut written = Vec::with_capacity(frames.len());
        let mut last_number = 0;

        for (index, frame) in frames.iter().enumerate() {
            let dir = self.camera_dir(index);
            let number = Self::next_index(&dir)?;
            let path = dir.join(format!("{:03}.{}", number, IMAGE_EXTENSION));

            frame.image.save(&path)?;
            debug!("Saved frame {} to {}", frame.frame_number, path.display());

            last_number = number;
            written.push(path);
        }

        info!("{:03} images captured", last_number);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    fn frame(width: u32, height: u32) -> FrameData {
        FrameData::new(RgbImage::new(width, height), 0.0, 1)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_regenerate_creates_empty_dirs() {
        let tmp = TempDir::new().unwrap();
        let store = FrameStore::new(tmp.path());

        fs::create_dir_all(store.camera_dir(0)).unwrap();
        fs::write(store.camera_dir(0).join("000.png"), b"stale").unwrap();

        store.regenerate(3).unwrap();

        assert_eq!(entries(tmp.path()), vec!["camera1", "camera2", "camera3"]);
        for index in 0..3 {
            assert!(entries(&store.camera_dir(index)).is_empty());
        }
    }

    #[test]
    fn test_prepare_keeps_existing_files() {
        let tmp = TempDir::new().unwrap();
        let store = FrameStore::new(tmp.path());

        fs::create_dir_all(store.camera_dir(0)).unwrap();
        fs::write(store.camera_dir(0).join("000.png"), b"kept").unwrap();

        store.prepare(2).unwrap();

        assert_eq!(entries(&store.camera_dir(0)), vec!["000.png"]);
        assert!(store.camera_dir(1).is_dir());
    }

    #[test]
    fn test_save_numbers_each_camera_independently() {
        let tmp = TempDir::new().unwrap();
        let store = FrameStore::new(tmp.path());
        store.regenerate(2).unwrap();

        // camera1 already holds two files, camera2 none
        store.save(&[frame(4, 4)]).unwrap();
        store.save(&[frame(4, 4)]).unwrap();

        let written = store.save(&[frame(4, 4), frame(8, 2)]).unwrap();

        assert_eq!(written[0], store.camera_dir(0).join("002.png"));
        assert_eq!(written[1], store.camera_dir(1).join("000.png"));
        assert_eq!(entries(&store.camera_dir(0)), vec!["000.png", "001.png", "002.png"]);
        assert_eq!(entries(&store.camera_dir(1)), vec!["000.png"]);

        let saved = image::open(&written[1]).unwrap();
        assert_eq!((saved.width(), saved.height()), (8, 2));
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let store = FrameStore::new(tmp.path());

        let result = store.save(&[frame(2, 2)]);
        assert!(matches!(result, Err(CaptureError::Io(_))));
    }
}
