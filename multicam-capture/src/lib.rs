//! Multicam Capture - synchronized color capture from several cameras
//!
//! One color stream is opened per attached camera and read in lock step: each
//! loop iteration pulls one frame from every camera, in enumeration order.
//! Frame sets can be saved into per-camera directories for an external
//! calibration tool.
//!
//! Backends:
//!
//! - Intel RealSense (via realsense-rust, requires `realsense` feature)
//! - Webcams (via nokhwa, requires `webcam` feature)
//! - Synthetic test patterns (always available)
//!
//! ## Example
//!
//! ```ignore
//! use multicam_capture::{CaptureSession, FrameStore, RealSenseCapture, StreamProfiles};
//!
//! let cameras = RealSenseCapture::open_all(&StreamProfiles::default())?;
//! let store = FrameStore::new(".");
//! store.prepare(cameras.len())?;
//! let sources = cameras.into_iter().map(|c| Box::new(c) as _).collect();
//! CaptureSession::new(sources, store, 400).run(&mut operator)?;
//! ```

mod preview;
mod session;
mod source;
mod store;
mod synthetic;

#[cfg(feature = "realsense")]
mod realsense;

#[cfg(feature = "webcam")]
mod webcam;

pub use preview::{DEFAULT_PREVIEW_HEIGHT, compose_preview, scale_to_height};
pub use session::{CaptureSession, Operator, OperatorCommand, SessionSummary};
pub use source::{
    CaptureError, CaptureSource, DeviceInfo, FrameData, StreamProfile, StreamProfiles,
    open_with_fallback,
};
pub use store::{FrameStore, IMAGE_EXTENSION};
pub use synthetic::{SyntheticCapture, SyntheticDevice};

#[cfg(feature = "realsense")]
pub use realsense::RealSenseCapture;

#[cfg(feature = "webcam")]
pub use webcam::WebcamCapture;
