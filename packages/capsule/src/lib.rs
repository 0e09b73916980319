//! # capsule
//!
//! Guest-side runtime for Capsule tasks.
//!
//! An [`App`] owns a task registry and the host-facing APIs. Define tasks on
//! it, then hand it the JSON request the host sends to the guest's `run`
//! export:
//!
//! ```rust
//! use std::sync::Arc;
//! use capsule::{arg, App, Imports, TaskOptions};
//! use serde_json::json;
//!
//! let app = App::new(Arc::new(Imports::none())).unwrap();
//! app.task_fn(TaskOptions::new("add").compute("low"), |args, _| {
//!     let a: i64 = arg(&args, 0)?;
//!     let b: i64 = arg(&args, 1)?;
//!     Ok(json!(a + b))
//! });
//!
//! let reply = futures::executor::block_on(app.run(r#"{"task_name":"add","args":[2,3]}"#));
//! assert_eq!(reply.unwrap(), r#"{"result":5}"#);
//! ```
//!
//! Without a host scheduler every task call runs in-process. With one, calls
//! go to the host and each task runs in its own isolated instance.
//!
//! The pieces are usable on their own:
//!
//! - [`capsule_task`]: task definitions, the registry and dispatch
//! - [`capsule_fs`]: mount-resolved file access
//! - [`capsule_http`]: HTTP through the host or a local transport
//! - [`capsule_env`]: environment variables, arguments and cwd
//! - [`capsule_host`]: the host capability traits
//!
//! With the `native` feature, [`runner`] runs task files through the
//! `capsule` CLI.

pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::AppConfig;
pub use error::{Error, Result};

pub use capsule_env::{Env, ProcessEnvironment};
pub use capsule_fs::{Files, FsError, LocalPreopens};
pub use capsule_host::{HostBridge, HostError, HostImports, Imports};
pub use capsule_http::{HttpClient, HttpConfig, Method, RequestOptions, Response};
pub use capsule_task::{
    arg, AsyncTask, Compute, ComputeTier, DispatchError, Kwargs, ResultEnvelope, SyncTask, Task,
    TaskConfig, TaskError, TaskFn, TaskOptions, TaskRequest, TaskResult, Timeout,
};

#[cfg(feature = "native")]
pub use capsule_runner as runner;

pub use capsule_env;
pub use capsule_fs;
pub use capsule_host;
pub use capsule_http;
pub use capsule_task;
