//! Common capture source types and traits.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Failed to capture frame: {0}")]
    CaptureFailed(String),

    #[error("Stream ended")]
    StreamEnded,

    #[error("Interrupted by operator")]
    Interrupted,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Identity of an attached camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Serial number reported by the device (or backend index when it has none).
    pub serial: String,
    /// Human readable device name.
    pub name: String,
}

impl DeviceInfo {
    pub fn new(serial: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.serial)
    }
}

/// Requested color stream resolution and frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProfile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl StreamProfile {
    /// Full HD at 30 fps.
    pub const PREFERRED: Self = Self::new(1920, 1080, 30);
    /// HD at 15 fps, for devices (or USB links) that reject full HD.
    pub const FALLBACK: Self = Self::new(1280, 720, 15);

    pub const fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }
}

impl fmt::Display for StreamProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} @ {} fps", self.width, self.height, self.fps)
    }
}

/// The preferred stream profile and the single fallback tried when a device rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamProfiles {
    pub preferred: StreamProfile,
    pub fallback: StreamProfile,
}

impl Default for StreamProfiles {
    fn default() -> Self {
        Self {
            preferred: StreamProfile::PREFERRED,
            fallback: StreamProfile::FALLBACK,
        }
    }
}

/// Open a device with the preferred profile, retrying once with the fallback.
///
/// An error from the fallback attempt is returned to the caller unchanged.
pub fn open_with_fallback<T, F>(
    device: &DeviceInfo,
    profiles: &StreamProfiles,
    mut open: F,
) -> Result<T, CaptureError>
where
    F: FnMut(StreamProfile) -> Result<T, CaptureError>,
{
    match open(profiles.preferred) {
        Ok(stream) => Ok(stream),
        Err(e) => {
            warn!(
                "Camera {} rejected {} ({}), retrying with {}",
                device, profiles.preferred, e, profiles.fallback
            );
            open(profiles.fallback)
        }
    }
}

/// Raw frame data from a capture source.
#[derive(Debug, Clone)]
pub struct FrameData {
    /// RGB image data.
    pub image: RgbImage,
    /// Frame timestamp in seconds (relative to stream start).
    pub timestamp: f64,
    /// Frame number.
    pub frame_number: u64,
}

impl FrameData {
    /// Create a new frame.
    pub fn new(image: RgbImage, timestamp: f64, frame_number: u64) -> Self {
        Self {
            image,
            timestamp,
            frame_number,
        }
    }

    /// Get image dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// A single open color stream on one camera.
pub trait CaptureSource {
    /// The device this stream belongs to.
    fn device(&self) -> &DeviceInfo;

    /// The profile the device accepted.
    fn profile(&self) -> StreamProfile;

    /// Block until the next frame arrives. Returns `None` once the source is stopped.
    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError>;

    /// Stop capturing.
    fn stop(&mut self);
}
