//! Multicam Extrinsics Crate
//!
//! Turns the pairwise camera poses produced by an extrinsic calibration tool
//! (optical frame convention, Z forward) into transforms between the cameras'
//! link frames (robot convention, X forward), ready to hand to a ROS 2 static
//! transform publisher.
//!
//! This crate is I/O-light: it reads one JSON document and produces strings.

mod calibration;
mod error;
mod extract;
mod offsets;
pub mod transform;

pub use calibration::{CalibrationResult, PAIR_SEPARATOR, PoseRecord, is_pairwise};
pub use error::ExtrinsicsError;
pub use extract::{ExtractedPose, PublisherFrames, extract_link_poses, write_report};
pub use offsets::MountingOffsets;
pub use transform::LinkTransform;
