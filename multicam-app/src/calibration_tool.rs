//! Runs the external calibration tool on the captured images.

use crate::config::CalibrationToolConfig;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Invocations of the calibration tool, run from the capture output directory.
pub struct CalibrationTool<'a> {
    config: &'a CalibrationToolConfig,
}

impl<'a> CalibrationTool<'a> {
    pub fn new(config: &'a CalibrationToolConfig) -> Self {
        Self { config }
    }

    /// `calibrate --boards <board file>`
    pub fn calibrate_args(&self) -> Vec<OsString> {
        vec![
            "calibrate".into(),
            "--boards".into(),
            self.config.boards.clone().into_os_string(),
        ]
    }

    /// `vis --workspace_file <workspace file>`
    pub fn visualize_args(&self) -> Vec<OsString> {
        vec![
            "vis".into(),
            "--workspace_file".into(),
            self.config.workspace_file.clone().into_os_string(),
        ]
    }

    /// Calibrate, then open the visualizer. Exit codes are logged, not acted on.
    ///
    /// Failing to spawn the program at all is an error.
    pub fn run(&self, working_dir: &Path) -> io::Result<()> {
        self.invoke(working_dir, self.calibrate_args())?;
        self.invoke(working_dir, self.visualize_args())?;
        Ok(())
    }

    fn invoke(&self, working_dir: &Path, args: Vec<OsString>) -> io::Result<()> {
        info!(
            "Running {} {}",
            self.config.program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let status = Command::new(&self.config.program)
            .args(&args)
            .current_dir(working_dir)
            .status()
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", self.config.program, e)))?;

        if status.success() {
            info!("{} finished", self.config.program);
        } else {
            warn!("{} exited with {}", self.config.program, status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_default_invocations() {
        let config = CalibrationToolConfig::default();
        let tool = CalibrationTool::new(&config);

        assert_eq!(tool.calibrate_args(), vec!["calibrate", "--boards", "board.yaml"]);
        assert_eq!(
            tool.visualize_args(),
            vec!["vis", "--workspace_file", "calibration.pkl"]
        );
    }

    #[test]
    fn test_custom_files() {
        let config = CalibrationToolConfig {
            boards: PathBuf::from("boards/charuco.yaml"),
            workspace_file: PathBuf::from("out/ws.pkl"),
            ..CalibrationToolConfig::default()
        };
        let tool = CalibrationTool::new(&config);

        assert_eq!(tool.calibrate_args()[2], "boards/charuco.yaml");
        assert_eq!(tool.visualize_args()[2], "out/ws.pkl");
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = CalibrationToolConfig {
            program: "multicam-test-no-such-program".to_string(),
            ..CalibrationToolConfig::default()
        };
        let err = CalibrationTool::new(&config).run(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
