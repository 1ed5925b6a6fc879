//! Intel RealSense color capture using realsense-rust.

use crate::source::{
    CaptureError, CaptureSource, DeviceInfo, FrameData, StreamProfile, StreamProfiles,
    open_with_fallback,
};
use image::RgbImage;
use realsense_rust::config::Config;
use realsense_rust::context::Context;
use realsense_rust::frame::ColorFrame;
use realsense_rust::kind::{Rs2CameraInfo, Rs2Format, Rs2StreamKind};
use realsense_rust::pipeline::{ActivePipeline, InactivePipeline};
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};

/// One RealSense device streaming 8-bit RGB color.
pub struct RealSenseCapture {
    pipeline: Option<ActivePipeline>,
    device: DeviceInfo,
    profile: StreamProfile,
    start_time: Instant,
    frame_count: u64,
    // Pipelines reference the librealsense context they were created from.
    _context: Rc<Context>,
}

impl RealSenseCapture {
    /// Start a color stream on the device with the given serial number.
    pub fn open(
        context: Rc<Context>,
        device: DeviceInfo,
        profile: StreamProfile,
    ) -> Result<Self, CaptureError> {
        let serial = CString::new(device.serial.as_str())
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

        let pipeline = InactivePipeline::try_from(context.as_ref())
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

        let mut config = Config::new();
        config
            .enable_device_from_serial(&serial)
            .and_then(|config| config.disable_all_streams())
            .and_then(|config| {
                config.enable_stream(
                    Rs2StreamKind::Color,
                    None,
                    profile.width as usize,
                    profile.height as usize,
                    Rs2Format::Rgb8,
                    profile.fps as usize,
                )
            })
            .map_err(|e| CaptureError::UnsupportedFormat(e.to_string()))?;

        let pipeline = pipeline
            .start(Some(config))
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

        info!("RealSense {} streaming at {}", device, profile);
        Ok(Self {
            pipeline: Some(pipeline),
            device,
            profile,
            start_time: Instant::now(),
            frame_count: 0,
            _context: context,
        })
    }

    /// Enumerate every attached RealSense and open it with the preferred/fallback policy.
    pub fn open_all(profiles: &StreamProfiles) -> Result<Vec<Self>, CaptureError> {
        let context =
            Rc::new(Context::new().map_err(|e| CaptureError::DeviceNotFound(e.to_string()))?);

        Self::list_devices_in(&context)?
            .into_iter()
            .map(|device| {
                info!("Camera {} found, starting stream", device);
                open_with_fallback(&device, profiles, |profile| {
                    Self::open(Rc::clone(&context), device.clone(), profile)
                })
            })
            .collect()
    }

    /// List attached RealSense devices.
    pub fn list_devices() -> Result<Vec<DeviceInfo>, CaptureError> {
        let context = Context::new().map_err(|e| CaptureError::DeviceNotFound(e.to_string()))?;
        Self::list_devices_in(&context)
    }

    fn list_devices_in(context: &Context) -> Result<Vec<DeviceInfo>, CaptureError> {
        fn text(value: Option<&CStr>) -> Option<String> {
            value.map(|s| s.to_string_lossy().into_owned())
        }

        context
            .query_devices(HashSet::new())
            .iter()
            .map(|device| {
                let serial = text(device.info(Rs2CameraInfo::SerialNumber)).ok_or_else(|| {
                    CaptureError::DeviceNotFound("device reports no serial number".to_string())
                })?;
                let name = text(device.info(Rs2CameraInfo::Name))
                    .unwrap_or_else(|| "Intel RealSense".to_string());
                Ok(DeviceInfo::new(serial, name))
            })
            .collect()
    }
}

impl CaptureSource for RealSenseCapture {
    fn device(&self) -> &DeviceInfo {
        &self.device
    }

    fn profile(&self) -> StreamProfile {
        self.profile
    }

    fn next_frame(&mut self) -> Result<Option<FrameData>, CaptureError> {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(None);
        };

        let frames = pipeline
            .wait(None)
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;
        let color = frames
            .frames_of_type::<ColorFrame>()
            .pop()
            .ok_or_else(|| CaptureError::CaptureFailed("frame set has no color frame".to_string()))?;

        // SAFETY: the frame owns `get_data_size()` bytes of RGB8 data for its lifetime.
        let data = unsafe {
            let ptr: *const u8 = (color.get_data() as *const std::os::raw::c_void).cast();
            std::slice::from_raw_parts(ptr, color.get_data_size()).to_vec()
        };
        let image = RgbImage::from_raw(color.width() as u32, color.height() as u32, data)
            .ok_or_else(|| CaptureError::CaptureFailed("Failed to create RGB image".to_string()))?;

        let timestamp = self.start_time.elapsed().as_secs_f64();
        self.frame_count += 1;
        debug!(
            "Captured frame {} from {} at {:.3}s",
            self.frame_count, self.device.serial, timestamp
        );

        Ok(Some(FrameData::new(image, timestamp, self.frame_count)))
    }

    fn stop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.stop();
            info!(
                "RealSense {} stopped after {} frames",
                self.device, self.frame_count
            );
        }
    }
}

impl Drop for RealSenseCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
