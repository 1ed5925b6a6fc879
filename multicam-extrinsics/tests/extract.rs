use multicam_extrinsics::{
    CalibrationResult, MountingOffsets, PublisherFrames, extract_link_poses, write_report,
};
use std::fs;
use tempfile::TempDir;

const CALIBRATION_JSON: &str = r#"{
    "cameras": {
        "cam1": { "model": "standard", "image_size": [1920, 1080] },
        "cam2": { "model": "standard", "image_size": [1920, 1080] }
    },
    "camera_poses": {
        "cam1": {
            "R": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            "T": [0.0, 0.0, 0.0]
        },
        "cam2_to_cam1": {
            "R": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            "T": [0.0, 0.0, 0.0]
        }
    }
}"#;

#[test]
fn identity_pose_reports_rig_constant() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("calibration.json");
    fs::write(&path, CALIBRATION_JSON).unwrap();

    let result = CalibrationResult::load(&path).unwrap();
    let poses = extract_link_poses(&result, &MountingOffsets::default()).unwrap();

    let mut out = Vec::new();
    write_report(&mut out, &poses, &PublisherFrames::default()).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines,
        vec![
            "cam2_to_cam1, [-0.0, 0.074, 0.0, 0.003, 0.002, 0.002, 1.0]",
            "ros2 run tf2_ros static_transform_publisher --x -0.0 --y 0.074 --z 0.0 \
             --qx 0.003 --qy 0.002 --qz 0.002 --qw 1.0 \
             --frame-id camera2_link --child-frame-id camera1_link",
        ]
    );
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = CalibrationResult::load(&dir.path().join("missing.json"));
    assert!(result.is_err());
}
