use thiserror::Error;

/// Errors raised while reading calibration output or converting poses.
#[derive(Debug, Error)]
pub enum ExtrinsicsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Calibration result has no 'camera_poses' section")]
    MissingPoses,

    #[error("Malformed pose '{name}': {source}")]
    MalformedPose {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Mounting offset for {0} is not invertible")]
    SingularOffset(&'static str),
}
