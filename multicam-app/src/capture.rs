//! `multicam capture` and `multicam devices`.

use crate::calibration_tool::CalibrationTool;
use crate::config::{AppConfig, CaptureConfig};
use crate::logging::LogRouter;
use crate::terminal::TerminalOperator;
use clap::ValueEnum;
use multicam_capture::{
    CaptureError, CaptureSession, CaptureSource, DeviceInfo, FrameStore, SyntheticCapture,
    SyntheticDevice,
};
use std::error::Error;
use tracing::info;

/// Camera backend to enumerate and open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Intel RealSense devices (needs the `realsense` feature)
    Realsense,
    /// UVC webcams (needs the `webcam` feature)
    Webcam,
    /// Generated test patterns
    Synthetic,
}

/// Options of a capture run that come from the command line.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub backend: Backend,
    /// Wipe the camera directories before capturing.
    pub regenerate: bool,
    /// Do not run the calibration tool after the operator quits.
    pub skip_calibration: bool,
}

fn synthetic_devices(config: &CaptureConfig) -> Vec<SyntheticDevice> {
    (0..config.synthetic_cameras)
        .map(|i| SyntheticDevice::new(i, config.profiles.preferred))
        .collect()
}

#[cfg(not(all(feature = "realsense", feature = "webcam")))]
fn feature_missing(backend: Backend, feature: &str) -> Box<dyn Error> {
    format!(
        "{:?} backend unavailable: rebuild with `--features {}`",
        backend, feature
    )
    .into()
}

/// List attached devices without opening them.
pub fn list_devices(
    backend: Backend,
    config: &CaptureConfig,
) -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
    match backend {
        Backend::Realsense => {
            #[cfg(feature = "realsense")]
            return Ok(multicam_capture::RealSenseCapture::list_devices()?);
            #[cfg(not(feature = "realsense"))]
            return Err(feature_missing(backend, "realsense"));
        }
        Backend::Webcam => {
            #[cfg(feature = "webcam")]
            return Ok(multicam_capture::WebcamCapture::list_devices()?);
            #[cfg(not(feature = "webcam"))]
            return Err(feature_missing(backend, "webcam"));
        }
        Backend::Synthetic => Ok(synthetic_devices(config)
            .into_iter()
            .map(|device| device.info)
            .collect()),
    }
}

/// Enumerate and open one stream per attached device.
pub fn open_sources(
    backend: Backend,
    config: &CaptureConfig,
) -> Result<Vec<Box<dyn CaptureSource>>, Box<dyn Error>> {
    let sources: Vec<Box<dyn CaptureSource>> = match backend {
        Backend::Realsense => {
            #[cfg(feature = "realsense")]
            {
                multicam_capture::RealSenseCapture::open_all(&config.profiles)?
                    .into_iter()
                    .map(|c| Box::new(c) as Box<dyn CaptureSource>)
                    .collect()
            }
            #[cfg(not(feature = "realsense"))]
            return Err(feature_missing(backend, "realsense"));
        }
        Backend::Webcam => {
            #[cfg(feature = "webcam")]
            {
                multicam_capture::WebcamCapture::open_all(&config.profiles)?
                    .into_iter()
                    .map(|c| Box::new(c) as Box<dyn CaptureSource>)
                    .collect()
            }
            #[cfg(not(feature = "webcam"))]
            return Err(feature_missing(backend, "webcam"));
        }
        Backend::Synthetic => {
            SyntheticCapture::open_all(&synthetic_devices(config), &config.profiles)?
                .into_iter()
                .map(|c| Box::new(c) as Box<dyn CaptureSource>)
                .collect()
        }
    };

    if sources.is_empty() {
        let reason = format!("no {:?} cameras attached", backend);
        return Err(CaptureError::DeviceNotFound(reason).into());
    }
    for source in &sources {
        info!("Camera {} streaming at {}", source.device(), source.profile());
    }
    Ok(sources)
}

/// Create (or wipe) the per-camera output directories.
pub fn prepare_store(
    store: &FrameStore,
    num_cameras: usize,
    regenerate: bool,
) -> Result<(), CaptureError> {
    if regenerate {
        store.regenerate(num_cameras)
    } else {
        store.prepare(num_cameras)
    }
}

/// Interactive capture followed by the calibration tool.
///
/// Log output moves into the terminal preview while it is open.
pub fn run(
    options: &CaptureOptions,
    config: &AppConfig,
    logs: &LogRouter,
) -> Result<(), Box<dyn Error>> {
    let capture = &config.capture;
    let sources = open_sources(options.backend, capture)?;

    let store = FrameStore::new(&capture.output_dir);
    prepare_store(&store, sources.len(), options.regenerate)?;

    let session = CaptureSession::new(sources, store, capture.preview_height);
    let mut operator = TerminalOperator::new(capture.poll_interval(), logs.clone())?;
    let summary = session.run(&mut operator)?;
    info!(
        "Saved {} frame sets over {} iterations",
        summary.captures, summary.iterations
    );

    if options.skip_calibration {
        info!("Skipping calibration tool");
        return Ok(());
    }
    CalibrationTool::new(&config.calibration_tool).run(&capture.output_dir)?;
    Ok(())
}
