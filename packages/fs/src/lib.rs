//! # capsule-fs
//!
//! File access for Capsule tasks.
//!
//! Inside a sandbox the host pre-opens the directories a task may use and
//! names each one with a guest mount path. [`Files`] maps a guest path such
//! as `./data/input.txt` onto one of those directories with [`resolve`] and
//! then works on the descriptor it found.
//!
//! Outside a sandbox, [`LocalPreopens`] exposes host directories the same
//! way so the API behaves identically.
//!
//! ```rust
//! use std::sync::Arc;
//! use capsule_fs::{Files, LocalPreopens};
//! use capsule_host::Imports;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let preopens = LocalPreopens::new().mount("data", dir.path());
//! let files = Files::new(Arc::new(Imports::none().with_preopens(Arc::new(preopens))));
//!
//! files.write_text("./data/output.txt", "done").unwrap();
//! assert_eq!(files.read_text("data/output.txt").unwrap(), "done");
//! assert!(files.exists("data/output.txt"));
//! ```

pub mod error;
pub mod files;
pub mod local;
pub mod resolver;

pub use error::{FsError, Result};
pub use files::Files;
pub use local::{LocalDescriptor, LocalPreopens};
pub use resolver::{normalize_path, resolve, ResolvedPath};
