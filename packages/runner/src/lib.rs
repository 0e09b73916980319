//! # capsule-runner
//!
//! Runs Capsule task files from a native application.
//!
//! The `capsule` CLI does the actual work: it builds the task file, starts
//! it in a sandbox and prints a [`ResultEnvelope`] when asked for `--json`.
//! This crate spawns it and decodes that envelope.
//!
//! ```ignore
//! use capsule_runner::{run, RunnerOptions};
//!
//! let envelope = run(&RunnerOptions::new("main.py").with_args(["--verbose"])).await?;
//! if envelope.success {
//!     println!("{}", envelope.result);
//! }
//! ```

pub mod error;
pub mod runner;

pub use capsule_task::ResultEnvelope;
pub use error::{Result, RunnerError};
pub use runner::{run, RunnerOptions};
