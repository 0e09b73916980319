//! # capsule-host
//!
//! The guest side of the Capsule host boundary.
//!
//! A Capsule task runs either directly in-process (local mode) or inside a
//! sandbox instance managed by the Capsule host (hosted mode). Everything the
//! host provides to the guest is modelled here as a capability trait:
//!
//! ```text
//! capsule:host/api
//!     schedule-task     # TaskScheduler - run a task in a new isolated instance
//!     http-request      # HostHttp      - host-mediated HTTP
//! wasi:filesystem
//!     preopens          # Preopens      - (descriptor, guest path) mounts
//!     types             # Descriptor    - open-at / read / write / stat / readdir
//! wasi:cli
//!     environment       # Environment   - variables, arguments, initial cwd
//! ```
//!
//! A [`HostImports`] value answers "which of these does the host expose right
//! now?". The [`HostBridge`] probes it once to decide the execution mode and
//! marshals task calls to the scheduler.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use capsule_host::{HostBridge, Imports};
//!
//! let bridge = HostBridge::new(Arc::new(Imports::none()));
//! assert!(!bridge.is_hosted());
//!
//! let reply = bridge.call_host("greet", &[serde_json::json!("World")], &serde_json::json!({}));
//! assert_eq!(reply, r#"{"result":"mock_result_for_greet"}"#);
//! ```

pub mod api;
pub mod bridge;
pub mod environment;
pub mod error;
pub mod filesystem;
pub mod imports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use api::{HostHttp, HostHttpResponse, TaskScheduler};
pub use bridge::{ExecutionMode, HostBridge};
pub use environment::Environment;
pub use error::{HostError, Result};
pub use filesystem::{
    Descriptor, DescriptorFlags, DescriptorStat, DescriptorType, DirectoryEntry, ErrorCode,
    OpenFlags, PathFlags, Preopens,
};
pub use imports::{HostImports, Imports};
