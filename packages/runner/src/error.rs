use thiserror::Error;

/// Errors that can occur when running a task file through the CLI
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Capsule CLI not found at '{path}'. Install the capsule CLI or set capsule_path.")]
    CliNotFound { path: String },

    /// The CLI failed without printing a result.
    #[error("{message}")]
    Failed { message: String },

    #[error("Failed to parse Capsule output: {output}")]
    Parse { output: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
