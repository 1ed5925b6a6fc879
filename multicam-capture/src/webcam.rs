//! Webcam capture using nokhwa.

use crate::source::{
    CaptureError, CaptureSource, DeviceInfo, FrameData, StreamProfile, StreamProfiles,
    open_with_fallback,
};
use image::RgbImage;
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use std::time::Instant;
use tracing::{debug, info};

/// Webcam capture source.
pub struct WebcamCapture {
    camera: Camera,
    device: DeviceInfo,
    profile: StreamProfile,
    start_time: Instant,
    frame_count: u64,
    active: bool,
}

impl WebcamCapture {
    /// Open a webcam stream with an exact profile; the device rejects formats it cannot deliver.
    pub fn open(
        index: CameraIndex,
        device: DeviceInfo,
        profile: StreamProfile,
    ) -> Result<Self, CaptureError> {
        info!("Opening webcam {} at {}", device, profile);

        let format = CameraFormat::new(
            Resolution::new(profile.width, profile.height),
            FrameFormat::MJPEG,
            profile.fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Exact(format));

        let mut camera =
            Camera::new(index, requested).map_err(|e| CaptureError::OpenFailed(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

        let resolution = camera.resolution();
        let profile = StreamProfile::new(
            resolution.width(),
            resolution.height(),
            camera.frame_rate(),
        );
        info!("Webcam {} opened: {}", device, profile);

        Ok(Self {
            camera,
            device,
            profile,
            start_time: Instant::now(),
            frame_count: 0,
            active: true,
        })
    }

    /// Open every attached webcam with the preferred/fallback policy.
    pub fn open_all(profiles: &StreamProfiles) -> Result<Vec<Self>, CaptureError> {
        let devices = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| CaptureError::DeviceNotFound(e.to_string()))?;

        devices
            .into_iter()
            .map(|info| {
                let device = DeviceInfo::new(info.index().to_string(), info.human_name());
                info!("Camera {} found, starting stream", device);
                open_with_fallback(&device, profiles, |profile| {
                    Self::open(info.index().clone(), device.clone(), profile)
                })
            })
            .collect()
    }

    /// List available webcam devices.
    pub fn list_devices() -> Result<Vec<DeviceInfo>, CaptureError> {
        let devices = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| CaptureError::DeviceNotFound(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|info| DeviceInfo::new(info.index().to_string(), info.human_name()))
            .collect())
    }
}

impl CaptureSource for WebcamCapture {
    fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn profile(&self) -> StreamProfile {
        self.profile
    }

    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        if !self.active {
            return Ok(None);
        }

        let frame = self
            .camera
            .frame()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        let timestamp = self.start_time.elapsed().as_secs_f64();
        self.frame_count += 1;

        debug!(
            "Captured frame {} from {} at {:.3}s",
            self.frame_count, self.device.serial, timestamp
        );

        // nokhwa links its own image version, so go through the raw buffer
        let (width, height) = (decoded.width(), decoded.height());
        let rgb_image = RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| CaptureError::CaptureFailed("Failed to create RGB image".to_string()))?;

        Ok(Some(FrameData::new(rgb_image, timestamp, self.frame_count)))
    }

    fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(e) = self.camera.stop_stream() {
            debug!("Webcam {} stop_stream failed: {}", self.device, e);
        }
        info!(
            "Webcam {} stopped after {} frames",
            self.device, self.frame_count
        );
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
