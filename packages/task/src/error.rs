//! Error types for task execution and dispatch.

use thiserror::Error;

/// A failure raised by a task function.
///
/// Carries the message plus an optional chain of causes, outermost first.
/// The chain plays the part of a stack trace on the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskError {
    message: String,
    causes: Vec<String>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Build from any error, keeping its `source()` chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            causes,
        }
    }

    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.causes.push(cause.to_string());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// The cause chain as newline-separated text, if there is one.
    pub fn trace(&self) -> Option<String> {
        if self.causes.is_empty() {
            None
        } else {
            Some(self.causes.join("\n"))
        }
    }

    /// Message followed by the trace, the way the dispatcher reports failures.
    pub fn to_wire(&self) -> String {
        match self.trace() {
            Some(trace) => format!("{}\n{}", self.message, trace),
            None => self.message.clone(),
        }
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        TaskError::new(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        TaskError::new(message)
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(error: serde_json::Error) -> Self {
        TaskError::from_error(&error)
    }
}

/// Errors from resolving and running a task invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid task request: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    #[error("No tasks or main() function found. Available tasks: {}", .available.join(", "))]
    TaskNotFound { available: Vec<String> },

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Failed to encode task result: {0}")]
    Encode(#[source] serde_json::Error),
}

impl DispatchError {
    /// Short type name used in result envelopes.
    pub fn error_type(&self) -> &'static str {
        match self {
            DispatchError::InvalidRequest(_) => "InvalidRequest",
            DispatchError::TaskNotFound { .. } => "TaskNotFound",
            DispatchError::Task(_) => "TaskError",
            DispatchError::Encode(_) => "EncodeError",
        }
    }

    /// The failure string handed back to the host.
    pub fn to_wire(&self) -> String {
        match self {
            DispatchError::Task(e) => e.to_wire(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for dispatch.
pub type Result<T> = std::result::Result<T, DispatchError>;
