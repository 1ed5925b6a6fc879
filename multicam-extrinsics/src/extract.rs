//! Pairwise pose extraction and console output.

use crate::calibration::CalibrationResult;
use crate::error::ExtrinsicsError;
use crate::offsets::MountingOffsets;
use crate::transform::{LinkTransform, OUTPUT_DECIMALS};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info, warn};

/// Frame names passed to the static transform publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherFrames {
    pub frame_id: String,
    pub child_frame_id: String,
}

impl Default for PublisherFrames {
    fn default() -> Self {
        Self {
            frame_id: "camera2_link".to_string(),
            child_frame_id: "camera1_link".to_string(),
        }
    }
}

/// One pairwise pose re-expressed between link frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPose {
    pub name: String,
    pub transform: LinkTransform,
}

impl ExtractedPose {
    /// `[x, y, z, qx, qy, qz, qw]` rounded for output.
    pub fn values(&self) -> [f64; 7] {
        self.transform.rounded(OUTPUT_DECIMALS)
    }

    fn formatted_values(&self) -> [String; 7] {
        self.values().map(format_value)
    }

    /// `<name>, [x, y, z, qx, qy, qz, qw]`
    pub fn tuple_line(&self) -> String {
        format!("{}, [{}]", self.name, self.formatted_values().join(", "))
    }

    /// Command line that publishes this pose as a ROS 2 static transform.
    pub fn publisher_command(&self, frames: &PublisherFrames) -> String {
        let [x, y, z, qx, qy, qz, qw] = self.formatted_values();
        format!(
            "ros2 run tf2_ros static_transform_publisher --x {} --y {} --z {} --qx {} --qy {} --qz {} --qw {} --frame-id {} --child-frame-id {}",
            x, y, z, qx, qy, qz, qw, frames.frame_id, frames.child_frame_id
        )
    }
}

/// Shortest decimal form that reads back to the same value; whole numbers keep a `.0`.
fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

/// Convert every pairwise pose of a calibration result, in document order.
pub fn extract_link_poses(
    result: &CalibrationResult,
    offsets: &MountingOffsets,
) -> Result<Vec<ExtractedPose>, ExtrinsicsError> {
    if result.is_empty() {
        warn!("camera_poses is empty, nothing to extract");
        return Ok(Vec::new());
    }

    let poses = result
        .pairwise_poses()
        .map(|pose| {
            let (name, record) = pose?;
            let composed = offsets.optical_to_link(&record.to_matrix())?;
            let transform = LinkTransform::from_matrix(&composed);
            debug!("Pose {} -> {:?}", name, transform.to_array());
            Ok(ExtractedPose {
                name: name.to_string(),
                transform,
            })
        })
        .collect::<Result<Vec<_>, ExtrinsicsError>>()?;

    info!(
        "Extracted {} pairwise poses ({} skipped)",
        poses.len(),
        result.len() - poses.len()
    );
    Ok(poses)
}

/// Print the tuple line and the publisher command for every pose.
pub fn write_report<W: Write>(
    out: &mut W,
    poses: &[ExtractedPose],
    frames: &PublisherFrames,
) -> std::io::Result<()> {
    for pose in poses {
        writeln!(out, "{}", pose.tuple_line())?;
        writeln!(out, "{}", pose.publisher_command(frames))?;
    }
    Ok(())
}
