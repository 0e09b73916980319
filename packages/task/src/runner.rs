//! The guest entrypoint: resolve a task request and run it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::envelope::{ExecutionInfo, ResultEnvelope};
use crate::error::{DispatchError, Result};
use crate::registry::TaskRegistry;
use crate::task::{Kwargs, TaskFn};

/// Name used when a request does not say which task to run.
pub const DEFAULT_TASK: &str = "main";

/// An invocation request as sent by the host.
///
/// Every field is optional; `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<Kwargs>,
}

impl TaskRequest {
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: Some(task_name.into()),
            ..Default::default()
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs = Some(kwargs);
        self
    }

    /// The requested name, or `main`.
    pub fn name(&self) -> &str {
        self.task_name.as_deref().unwrap_or(DEFAULT_TASK)
    }
}

/// Dispatches task requests against a registry.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    registry: Arc<TaskRegistry>,
}

impl TaskRunner {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Pick the task for `name`.
    ///
    /// Tries the name itself, then `main`, then the first registered task.
    pub fn resolve(&self, name: &str) -> Result<(String, Arc<dyn TaskFn>)> {
        if let Some(func) = self.registry.get(name) {
            return Ok((name.to_string(), func));
        }

        if name != DEFAULT_TASK {
            if let Some(func) = self.registry.get(DEFAULT_TASK) {
                tracing::debug!(requested = name, "task not found, falling back to main");
                return Ok((DEFAULT_TASK.to_string(), func));
            }
        }

        if let Some((first, func)) = self.registry.first() {
            tracing::debug!(
                requested = name,
                fallback = %first,
                "task not found, falling back to first registered task"
            );
            return Ok((first, func));
        }

        Err(DispatchError::TaskNotFound {
            available: self.registry.names(),
        })
    }

    /// Run a request and return the task's value.
    pub async fn dispatch(&self, request: TaskRequest) -> Result<Value> {
        let (_, func) = self.resolve(request.name())?;
        let args = request.args.unwrap_or_default();
        let kwargs = request.kwargs.unwrap_or_default();

        Ok(func.call(args, kwargs).resolve().await?)
    }

    /// Wire entrypoint.
    ///
    /// Success is the JSON text `{"result": ...}`. Failure is a plain
    /// string: the message, then a newline and the cause chain if any.
    pub async fn run(&self, args_json: &str) -> std::result::Result<String, String> {
        self.run_request(args_json).await.map_err(|e| {
            tracing::debug!(error = %e, "task dispatch failed");
            e.to_wire()
        })
    }

    async fn run_request(&self, args_json: &str) -> Result<String> {
        let request: TaskRequest =
            serde_json::from_str(args_json).map_err(DispatchError::InvalidRequest)?;
        let result = self.dispatch(request).await?;
        serde_json::to_string(&json!({ "result": result })).map_err(DispatchError::Encode)
    }

    /// Run a request in-process and wrap the outcome in a result envelope.
    pub async fn invoke(&self, request: TaskRequest) -> ResultEnvelope {
        let execution = ExecutionInfo::local(request.name());
        match self.dispatch(request).await {
            Ok(result) => ResultEnvelope::success(result, execution),
            Err(e) => ResultEnvelope::failure(e.error_type(), e.to_wire(), execution),
        }
    }
}
