//! Task callables and the `Task` wrapper that routes calls to the host.

use std::future::Future;
use std::sync::Arc;

use capsule_host::HostBridge;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::{TaskConfig, TaskOptions};
use crate::error::TaskError;
use crate::registry::TaskRegistry;

/// Keyword arguments passed to a task.
pub type Kwargs = Map<String, Value>;

/// What a task produces once it settles.
pub type TaskResult = std::result::Result<Value, TaskError>;

/// The immediate return of a task call: a value, or a future of one.
pub enum TaskOutput {
    Ready(TaskResult),
    Pending(BoxFuture<'static, TaskResult>),
}

impl TaskOutput {
    /// Wait for the task to settle.
    pub async fn resolve(self) -> TaskResult {
        match self {
            TaskOutput::Ready(result) => result,
            TaskOutput::Pending(future) => future.await,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TaskOutput::Pending(_))
    }
}

impl std::fmt::Debug for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskOutput::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            TaskOutput::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A function that can be registered as a task.
///
/// Takes positional arguments and a keyword map. Implemented by
/// [`SyncTask`] and [`AsyncTask`] for plain closures.
pub trait TaskFn: Send + Sync {
    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> TaskOutput;
}

/// Adapts a synchronous closure.
pub struct SyncTask<F>(F);

impl<F> SyncTask<F>
where
    F: Fn(Vec<Value>, Kwargs) -> TaskResult + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        SyncTask(f)
    }

    pub fn shared(f: F) -> Arc<dyn TaskFn> {
        Arc::new(SyncTask(f))
    }
}

impl<F> TaskFn for SyncTask<F>
where
    F: Fn(Vec<Value>, Kwargs) -> TaskResult + Send + Sync,
{
    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> TaskOutput {
        TaskOutput::Ready((self.0)(args, kwargs))
    }
}

/// Adapts a closure returning a future.
pub struct AsyncTask<F>(F);

impl<F, Fut> AsyncTask<F>
where
    F: Fn(Vec<Value>, Kwargs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        AsyncTask(f)
    }

    pub fn shared(f: F) -> Arc<dyn TaskFn> {
        Arc::new(AsyncTask(f))
    }
}

impl<F, Fut> TaskFn for AsyncTask<F>
where
    F: Fn(Vec<Value>, Kwargs) -> Fut + Send + Sync,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> TaskOutput {
        TaskOutput::Pending((self.0)(args, kwargs).boxed())
    }
}

/// Decode positional argument `index`.
pub fn arg<T: DeserializeOwned>(args: &[Value], index: usize) -> std::result::Result<T, TaskError> {
    let value = args
        .get(index)
        .ok_or_else(|| TaskError::new(format!("missing argument {}", index)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| TaskError::new(format!("invalid argument {}: {}", index, e)))
}

/// A defined task.
///
/// Calling it runs the function in-process outside a host, or schedules it
/// in a new isolated instance when hosted.
#[derive(Clone)]
pub struct Task {
    config: TaskConfig,
    func: Arc<dyn TaskFn>,
    bridge: Arc<HostBridge>,
}

impl Task {
    /// Normalize `options`, register `func` under the task name and return
    /// a handle for calling it.
    pub fn define(
        registry: &TaskRegistry,
        bridge: Arc<HostBridge>,
        options: TaskOptions,
        func: Arc<dyn TaskFn>,
    ) -> Self {
        let config = options.normalize();
        registry.register(config.name.clone(), func.clone(), config.clone());
        Self {
            config,
            func,
            bridge,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub async fn call(&self, args: Vec<Value>) -> TaskResult {
        if !self.bridge.is_hosted() {
            return self.func.call(args, Kwargs::new()).resolve().await;
        }

        let reply = self.bridge.call_host(&self.config.name, &args, &self.config);
        parse_reply(&self.config.name, reply)
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("config", &self.config).finish()
    }
}

/// Interpret the host's reply to a scheduled task.
fn parse_reply(name: &str, reply: String) -> TaskResult {
    let parsed: Value = match serde_json::from_str(&reply) {
        Ok(parsed) => parsed,
        // Plain-text replies are returned as they are.
        Err(_) => return Ok(Value::String(reply)),
    };

    let Value::Object(mut fields) = parsed else {
        return Ok(Value::Null);
    };

    if let Some(error) = fields.get("error").filter(|e| is_truthy(e)) {
        let error = match error {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        };
        return Err(TaskError::new(format!("Task {} failed: {}", name, error)));
    }

    Ok(fields.remove("result").unwrap_or(Value::Null))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
