//! The result envelope returned to application callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a task invocation as reported to the application.
///
/// `result` is meaningful when `success` is true, `error` otherwise.
/// `execution` is always present; outside a sandbox its counters are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<EnvelopeError>,
    pub execution: ExecutionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub error_type: String,
    pub message: String,
}

/// Execution metrics reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionInfo {
    pub task_name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub fuel_consumed: u64,
}

impl ExecutionInfo {
    /// Metrics for a run outside any sandbox.
    pub fn local(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            ..Default::default()
        }
    }
}

impl ResultEnvelope {
    pub fn success(result: Value, execution: ExecutionInfo) -> Self {
        Self {
            success: true,
            result,
            error: None,
            execution,
        }
    }

    pub fn failure(
        error_type: impl Into<String>,
        message: impl Into<String>,
        execution: ExecutionInfo,
    ) -> Self {
        Self {
            success: false,
            result: Value::Null,
            error: Some(EnvelopeError {
                error_type: error_type.into(),
                message: message.into(),
            }),
            execution,
        }
    }

    /// The result on success, the error otherwise.
    pub fn into_result(self) -> Result<Value, EnvelopeError> {
        match (self.success, self.error) {
            (true, _) => Ok(self.result),
            (false, Some(error)) => Err(error),
            (false, None) => Err(EnvelopeError {
                error_type: "Unknown".to_string(),
                message: "task failed without an error".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_with_structured_result_survives_json() {
        let envelope = ResultEnvelope::success(
            json!({"items": [1, 2, 3], "done": true}),
            ExecutionInfo {
                task_name: "collect".into(),
                duration_ms: 12,
                retries: 1,
                fuel_consumed: 4096,
            },
        );
        let text = serde_json::to_string(&envelope).unwrap();
        assert_eq!(serde_json::from_str::<ResultEnvelope>(&text).unwrap(), envelope);
    }

    #[test]
    fn null_result_and_null_error_are_written_out() {
        let envelope = ResultEnvelope::success(Value::Null, ExecutionInfo::local("main"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "result": null,
                "error": null,
                "execution": {"task_name": "main", "duration_ms": 0, "retries": 0, "fuel_consumed": 0}
            })
        );
        let text = serde_json::to_string(&envelope).unwrap();
        assert_eq!(serde_json::from_str::<ResultEnvelope>(&text).unwrap(), envelope);
    }

    #[test]
    fn failure_survives_json() {
        let envelope = ResultEnvelope::failure(
            "TaskNotFound",
            "No tasks or main() function found. Available tasks: ",
            ExecutionInfo::local("boom"),
        );
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: ResultEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(parsed.into_result().unwrap_err().error_type, "TaskNotFound");
    }

    #[test]
    fn decodes_cli_output() {
        let text = r#"{
            "success": true,
            "result": "Hello, World!",
            "error": null,
            "execution": {"task_name": "main", "duration_ms": 31, "retries": 0, "fuel_consumed": 120034}
        }"#;
        let envelope: ResultEnvelope = serde_json::from_str(text).unwrap();
        assert_eq!(envelope.execution.fuel_consumed, 120034);
        assert_eq!(envelope.into_result().unwrap(), json!("Hello, World!"));
    }
}
