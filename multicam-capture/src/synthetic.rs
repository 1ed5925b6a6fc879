//! Synthetic capture source producing deterministic test patterns.
//!
//! Useful for dry runs of the capture loop without hardware attached.

use crate::source::{
    CaptureError, CaptureSource, DeviceInfo, FrameData, StreamProfile, StreamProfiles,
    open_with_fallback,
};
use image::{Rgb, RgbImage};
use std::time::Instant;
use tracing::{debug, info};

/// A simulated camera and the largest profile it accepts.
#[derive(Debug, Clone)]
pub struct SyntheticDevice {
    pub info: DeviceInfo,
    pub max_profile: StreamProfile,
}

impl SyntheticDevice {
    pub fn new(index: usize, max_profile: StreamProfile) -> Self {
        Self {
            info: DeviceInfo::new(
                format!("SYN{:04}", index + 1),
                format!("Synthetic camera {}", index + 1),
            ),
            max_profile,
        }
    }

    fn accepts(&self, profile: StreamProfile) -> bool {
        profile.width <= self.max_profile.width
            && profile.height <= self.max_profile.height
            && profile.fps <= self.max_profile.fps
    }
}

/// Test pattern source: a per-device tint with a bar that sweeps across the frame.
pub struct SyntheticCapture {
    device: DeviceInfo,
    profile: StreamProfile,
    tint: Rgb<u8>,
    start_time: Instant,
    frame_count: u64,
    active: bool,
}

impl SyntheticCapture {
    /// Open a synthetic stream, failing like real hardware when the profile exceeds the device limit.
    pub fn open(device: &SyntheticDevice, profile: StreamProfile) -> Result<Self, CaptureError> {
        if !device.accepts(profile) {
            return Err(CaptureError::OpenFailed(format!(
                "{} does not support {}",
                device.info, profile
            )));
        }

        let seed = device
            .info
            .serial
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        let [r, g, b, _] = seed.to_le_bytes();

        info!("Synthetic camera {} streaming at {}", device.info, profile);
        Ok(Self {
            device: device.info.clone(),
            profile,
            tint: Rgb([r, g, b]),
            start_time: Instant::now(),
            frame_count: 0,
            active: true,
        })
    }

    /// Open every device, each with the preferred/fallback policy.
    pub fn open_all(
        devices: &[SyntheticDevice],
        profiles: &StreamProfiles,
    ) -> Result<Vec<Self>, CaptureError> {
        devices
            .iter()
            .map(|device| {
                open_with_fallback(&device.info, profiles, |profile| Self::open(device, profile))
            })
            .collect()
    }

    fn render(&self) -> RgbImage {
        let StreamProfile { width, height, .. } = self.profile;
        let bar_width = (width / 16).max(1);
        let bar_x = ((self.frame_count * 8) % width as u64) as u32;
        RgbImage::from_fn(width, height, |x, y| {
            if x >= bar_x && x < bar_x + bar_width {
                Rgb([255, 255, 255])
            } else {
                let shade = (y * 255 / height.max(1)) as u16;
                let [r, g, b] = self.tint.0;
                Rgb([
                    ((r as u16 + shade) / 2) as u8,
                    ((g as u16 + shade) / 2) as u8,
                    ((b as u16 + shade) / 2) as u8,
                ])
            }
        })
    }
}

impl CaptureSource for SyntheticCapture {
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

        let image = self.render();
        let timestamp = self.start_time.elapsed().as_secs_f64();
        self.frame_count += 1;
        debug!("Synthetic frame {} from {}", self.frame_count, self.device.serial);

        Ok(Some(FrameData::new(image, timestamp, self.frame_count)))
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            info!(
                "Synthetic camera {} stopped after {} frames",
                self.device, self.frame_count
            );
        }
    }
}
