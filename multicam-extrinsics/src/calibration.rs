//! Calibration result loading.
//!
//! The calibration tool writes a JSON document whose `camera_poses` object maps
//! pose names to `{ "R": [[..3]; 3], "T": [..3] }` in the optical convention.
//! Pairwise poses are named `<camA>_to_<camB>`; the base camera appears under
//! its bare name and carries no relation.

use crate::error::ExtrinsicsError;
use crate::transform::pose_matrix;
use glam::DMat4;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Substring that marks a pose name as a relation between two cameras.
pub const PAIR_SEPARATOR: &str = "_to_";

/// Whether `name` describes a relation between two cameras (and not the base camera).
pub fn is_pairwise(name: &str) -> bool {
    name.contains(PAIR_SEPARATOR)
}

/// Raw rotation + translation as written by the calibration tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// Rotation matrix, row major.
    #[serde(rename = "R")]
    pub rotation: [[f64; 3]; 3],
    /// Translation vector.
    #[serde(rename = "T")]
    pub translation: [f64; 3],
}

impl PoseRecord {
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0; 3],
        }
    }

    /// The pose as a 4x4 homogeneous transform.
    pub fn to_matrix(&self) -> DMat4 {
        pose_matrix(&self.rotation, &self.translation)
    }
}

#[derive(Deserialize)]
struct CalibrationFile {
    #[serde(default)]
    camera_poses: Option<Map<String, Value>>,
}

/// The pose section of a calibration result, in document order.
#[derive(Debug, Clone, Default)]
pub struct CalibrationResult {
    poses: Map<String, Value>,
}

impl CalibrationResult {
    /// Load a calibration result from a JSON file.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ExtrinsicsError> {
        debug!("Loading calibration result from: {}", path.display());
        let file = File::open(path)?;
        let result = Self::from_reader(BufReader::new(file))?;
        info!("Calibration result parsed: {} poses", result.len());
        Ok(result)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ExtrinsicsError> {
        let file: CalibrationFile = serde_json::from_reader(reader)?;
        file.camera_poses
            .map(|poses| Self { poses })
            .ok_or(ExtrinsicsError::MissingPoses)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ExtrinsicsError> {
        Self::from_reader(json.as_bytes())
    }

    /// Number of poses of any kind, base camera included.
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Parsed pairwise poses in document order; non-pairwise entries are skipped unparsed.
    pub fn pairwise_poses(
        &self,
    ) -> impl Iterator<Item = Result<(&str, PoseRecord), ExtrinsicsError>> + '_ {
        self.poses
            .iter()
            .filter(|(name, _)| is_pairwise(name))
            .map(|(name, value)| {
                PoseRecord::deserialize(value)
                    .map(|record| (name.as_str(), record))
                    .map_err(|source| ExtrinsicsError::MalformedPose {
                        name: name.clone(),
                        source,
                    })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "cameras": {},
        "camera_poses": {
            "cam1": { "R": [[1, 0, 0], [0, 1, 0], [0, 0, 1]], "T": [0, 0, 0] },
            "cam2_to_cam1": {
                "R": [[0, -1, 0], [1, 0, 0], [0, 0, 1]],
                "T": [0.1, 0.2, 0.3]
            },
            "cam3_to_cam1": { "R": [[1, 0, 0], [0, 1, 0], [0, 0, 1]], "T": [1, 0, 0] }
        }
    }"#;

    #[test]
    fn test_is_pairwise() {
        assert!(is_pairwise("cam2_to_cam1"));
        assert!(!is_pairwise("cam1"));
        assert!(!is_pairwise("cam2to_cam1"));
    }

    #[test]
    fn test_pairwise_poses_in_document_order() {
        let result = CalibrationResult::from_json_str(SAMPLE).unwrap();
        assert_eq!(result.len(), 3);

        let poses: Vec<_> = result.pairwise_poses().collect::<Result<_, _>>().unwrap();
        let names: Vec<&str> = poses.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["cam2_to_cam1", "cam3_to_cam1"]);
        assert_eq!(poses[0].1.translation, [0.1, 0.2, 0.3]);
        assert_eq!(poses[0].1.rotation[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_base_camera_is_not_parsed() {
        let json = r#"{ "camera_poses": {
            "cam1": { "unexpected": true },
            "cam2_to_cam1": { "R": [[1, 0, 0], [0, 1, 0], [0, 0, 1]], "T": [0, 0, 0] }
        } }"#;
        let result = CalibrationResult::from_json_str(json).unwrap();
        assert_eq!(result.pairwise_poses().count(), 1);
        assert!(result.pairwise_poses().all(|pose| pose.is_ok()));
    }

    #[test]
    fn test_missing_pose_section() {
        let result = CalibrationResult::from_json_str(r#"{ "cameras": {} }"#);
        assert!(matches!(result, Err(ExtrinsicsError::MissingPoses)));
    }

    #[test]
    fn test_malformed_pairwise_pose() {
        let json = r#"{ "camera_poses": { "cam2_to_cam1": { "R": [[1, 0, 0]], "T": [0, 0, 0] } } }"#;
        let result = CalibrationResult::from_json_str(json).unwrap();
        let err = result.pairwise_poses().next().unwrap().unwrap_err();
        match err {
            ExtrinsicsError::MalformedPose { name, .. } => assert_eq!(name, "cam2_to_cam1"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_record_matrix_layout() {
        let record = PoseRecord {
            rotation: [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [1.0, 2.0, 3.0],
        };
        let m = record.to_matrix();
        // column 0 holds the first entries of each row
        assert_eq!(m.x_axis.truncate().to_array(), [0.0, 1.0, 0.0]);
        assert_eq!(m.w_axis.to_array(), [1.0, 2.0, 3.0, 1.0]);
    }
}
