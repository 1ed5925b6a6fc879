//! `multicam extract`: print link-frame transforms from a calibration result.

use crate::config::ExtractConfig;
use multicam_extrinsics::{CalibrationResult, extract_link_poses, write_report};
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Extract every pairwise pose in `input` and write the report to `out`.
pub fn run<W: Write>(
    config: &ExtractConfig,
    input: &Path,
    out: &mut W,
) -> Result<usize, Box<dyn Error>> {
    let result = CalibrationResult::load(input)?;
    let poses = extract_link_poses(&result, &config.offsets)?;
    if poses.is_empty() {
        info!("No pairwise poses in {}", input.display());
    }
    write_report(out, &poses, &config.frames)?;
    Ok(poses.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reports_each_pairwise_pose() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("calibration.json");
        fs::write(
            &path,
            r#"{"camera_poses": {
                "cam1": {"R": [[1,0,0],[0,1,0],[0,0,1]], "T": [0,0,0]},
                "cam2_to_cam1": {"R": [[1,0,0],[0,1,0],[0,0,1]], "T": [0,0,0]}
            }}"#,
        )
        .unwrap();

        let mut out = Vec::new();
        let count = run(&ExtractConfig::default(), &path, &mut out).unwrap();
        assert_eq!(count, 1);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("cam2_to_cam1, [-0.0, 0.074, 0.0,"));
        assert!(text.contains("--frame-id camera2_link --child-frame-id camera1_link"));
    }

    #[test]
    fn test_missing_poses_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("calibration.json");
        fs::write(&path, r#"{"cameras": {}}"#).unwrap();

        let mut out = Vec::new();
        assert!(run(&ExtractConfig::default(), &path, &mut out).is_err());
        assert!(out.is_empty());
    }
}
