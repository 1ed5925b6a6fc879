//! Application configuration.
//!
//! Everything has a default matching the two-camera rig it was built for, so the JSON
//! config file is optional and may set any subset of fields.

use multicam_capture::{DEFAULT_PREVIEW_HEIGHT, StreamProfiles};
use multicam_extrinsics::{MountingOffsets, PublisherFrames};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Capture loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub profiles: StreamProfiles,
    pub preview_height: u32,
    /// How long each key poll waits, in milliseconds.
    pub poll_interval_ms: u64,
    /// Root that holds the camera1..cameraN directories.
    pub output_dir: PathBuf,
    /// Number of cameras simulated by the synthetic backend.
    pub synthetic_cameras: usize,
}

impl CaptureConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            profiles: StreamProfiles::default(),
            preview_height: DEFAULT_PREVIEW_HEIGHT,
            poll_interval_ms: 1,
            output_dir: PathBuf::from("."),
            synthetic_cameras: 2,
        }
    }
}

/// External calibration tool run after capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationToolConfig {
    pub program: String,
    /// Board description file passed to the calibrate step.
    pub boards: PathBuf,
    /// Workspace file written by calibrate and read by the visualizer.
    pub workspace_file: PathBuf,
}

impl Default for CalibrationToolConfig {
    fn default() -> Self {
        Self {
            program: "multical".to_string(),
            boards: PathBuf::from("board.yaml"),
            workspace_file: PathBuf::from("calibration.pkl"),
        }
    }
}

/// Transform extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Calibration result written by the calibration tool.
    pub input: PathBuf,
    pub offsets: MountingOffsets,
    pub frames: PublisherFrames,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("calibration.json"),
            offsets: MountingOffsets::default(),
            frames: PublisherFrames::default(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub capture: CaptureConfig,
    pub calibration_tool: CalibrationToolConfig,
    pub extract: ExtractConfig,
}

impl AppConfig {
    /// Load from a JSON file, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        let config = serde_json::from_str(&data)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multicam_capture::StreamProfile;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_rig() {
        let config = AppConfig::default();
        assert_eq!(config.capture.profiles.preferred, StreamProfile::new(1920, 1080, 30));
        assert_eq!(config.capture.profiles.fallback, StreamProfile::new(1280, 720, 15));
        assert_eq!(config.capture.preview_height, 400);
        assert_eq!(config.calibration_tool.program, "multical");
        assert_eq!(config.extract.frames.frame_id, "camera2_link");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_partial_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"{
                "capture": { "preview_height": 240, "profiles": { "fallback": { "width": 640, "height": 480, "fps": 30 } } },
                "extract": { "frames": { "frame_id": "base_link" } }
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.capture.preview_height, 240);
        assert_eq!(config.capture.profiles.preferred, StreamProfile::PREFERRED);
        assert_eq!(config.capture.profiles.fallback, StreamProfile::new(640, 480, 30));
        assert_eq!(config.extract.frames.frame_id, "base_link");
        assert_eq!(config.extract.frames.child_frame_id, "camera1_link");
        assert_eq!(config.extract.offsets, MountingOffsets::default());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "{ not json").unwrap();
        assert!(AppConfig::load(Some(file.path())).is_err());
    }
}
