//! Mounting offsets between each camera's optical frame and its link frame.
//!
//! The optical frame is Z forward (what the calibration tool reports); the
//! link frame is the robot convention, X forward, attached to the mount. The
//! defaults are the measured offsets of the two-camera rig this tool was
//! built for and can be overridden from configuration.

use crate::error::ExtrinsicsError;
use crate::transform::{from_rows, to_rows};
use glam::DMat4;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const CAMERA1_OPTICAL_TO_LINK: [[f64; 4]; 4] = [
    [0.002, -1.000, 0.005, -0.059],
    [0.003, -0.005, -1.000, -0.000],
    [1.000, 0.002, 0.003, 0.000],
    [0.000, 0.000, 0.000, 1.000],
];

const CAMERA2_OPTICAL_TO_LINK: [[f64; 4]; 4] = [
    [0.005, -1.000, -0.002, 0.015],
    [0.000, 0.002, -1.000, -0.000],
    [1.000, 0.005, 0.000, -0.000],
    [0.000, 0.000, 0.000, 1.000],
];

/// Optical-to-link transforms of the two cameras in a pairwise pose.
///
/// Serialized as row-major 4x4 arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountingOffsets {
    #[serde(with = "row_major")]
    pub camera1_optical_to_link: DMat4,
    #[serde(with = "row_major")]
    pub camera2_optical_to_link: DMat4,
}

impl MountingOffsets {
    pub fn new(camera1_optical_to_link: DMat4, camera2_optical_to_link: DMat4) -> Self {
        Self {
            camera1_optical_to_link,
            camera2_optical_to_link,
        }
    }

    /// Offsets that leave the pairwise pose unchanged.
    pub fn identity() -> Self {
        Self::new(DMat4::IDENTITY, DMat4::IDENTITY)
    }

    /// Re-express a camera2-optical to camera1-optical pose between the two link frames.
    ///
    /// `inverse(camera2_optical_to_link) * pairwise * camera1_optical_to_link`
    pub fn optical_to_link(&self, pairwise: &DMat4) -> Result<DMat4, ExtrinsicsError> {
        if self.camera2_optical_to_link.determinant().abs() < f64::EPSILON {
            return Err(ExtrinsicsError::SingularOffset("camera2"));
        }
        Ok(self.camera2_optical_to_link.inverse() * *pairwise * self.camera1_optical_to_link)
    }
}

impl Default for MountingOffsets {
    fn default() -> Self {
        Self::new(
            from_rows(&CAMERA1_OPTICAL_TO_LINK),
            from_rows(&CAMERA2_OPTICAL_TO_LINK),
        )
    }
}

mod row_major {
    use super::*;

    pub fn serialize<S: Serializer>(m: &DMat4, serializer: S) -> Result<S::Ok, S::Error> {
        to_rows(m).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DMat4, D::Error> {
        let rows = <[[f64; 4]; 4]>::deserialize(deserializer)?;
        Ok(from_rows(&rows))
    }
}
