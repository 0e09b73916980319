//! # capsule-task
//!
//! Task definition and dispatch for Capsule guests.
//!
//! - [`TaskOptions`] are normalized into a [`TaskConfig`], the form the host
//!   receives.
//! - [`TaskRegistry`] keeps every defined task by name, in definition order.
//! - [`Task`] is the handle user code calls: in-process outside a host,
//!   through [`HostBridge::call_host`](capsule_host::HostBridge::call_host)
//!   when hosted.
//! - [`TaskRunner`] is the entrypoint the host invokes inside a fresh
//!   instance. It resolves the requested task, falling back to `main` and
//!   then to the first registered task.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use capsule_task::{arg, SyncTask, TaskRegistry, TaskRunner, TaskOptions};
//!
//! let registry = Arc::new(TaskRegistry::new());
//! registry.register(
//!     "add",
//!     SyncTask::shared(|args, _| {
//!         let a: i64 = arg(&args, 0)?;
//!         let b: i64 = arg(&args, 1)?;
//!         Ok(serde_json::json!(a + b))
//!     }),
//!     TaskOptions::new("add").normalize(),
//! );
//!
//! let runner = TaskRunner::new(registry);
//! let reply = futures::executor::block_on(runner.run(r#"{"task_name":"add","args":[2,3]}"#));
//! assert_eq!(reply.unwrap(), r#"{"result":5}"#);
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod runner;
pub mod task;

pub use config::{normalize_timeout, Compute, ComputeTier, TaskConfig, TaskOptions, Timeout};
pub use envelope::{EnvelopeError, ExecutionInfo, ResultEnvelope};
pub use error::{DispatchError, Result, TaskError};
pub use registry::{TaskInfo, TaskRegistry};
pub use runner::{TaskRequest, TaskRunner, DEFAULT_TASK};
pub use task::{arg, AsyncTask, Kwargs, SyncTask, Task, TaskFn, TaskOutput, TaskResult};
