use capsule_host::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    /// No preopened directories are exposed.
    #[error("Filesystem not available.")]
    Unavailable,

    /// A descriptor operation failed.
    #[error("Failed to {action} '{path}': {source}")]
    Operation {
        action: &'static str,
        path: String,
        source: ErrorCode,
    },

    #[error("Failed to read file '{path}': {source}")]
    InvalidUtf8 {
        path: String,
        source: std::string::FromUtf8Error,
    },
}

impl FsError {
    pub(crate) fn operation(action: &'static str, path: &str, source: ErrorCode) -> Self {
        FsError::Operation {
            action,
            path: path.to_string(),
            source,
        }
    }

    /// The descriptor error code, for operation failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            FsError::Operation { source, .. } => Some(*source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
