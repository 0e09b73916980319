//! Error types for host capability calls.

use thiserror::Error;

/// Errors raised when crossing the host boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The capability is not exposed by the host.
    #[error("{0} not available")]
    Unavailable(&'static str),

    /// The host raised a failure while servicing the call.
    #[error("{0}")]
    Call(String),
}

impl HostError {
    pub fn call(message: impl Into<String>) -> Self {
        HostError::Call(message.into())
    }
}

/// Result type alias for host calls.
pub type Result<T> = std::result::Result<T, HostError>;
