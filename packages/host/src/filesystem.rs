//! WASI-style filesystem capability (`wasi:filesystem/types` + `preopens`).
//!
//! Only the subset the guest file APIs need is modelled: opening paths
//! relative to a directory descriptor, positional reads and writes, `stat`
//! and directory listing.

use std::sync::Arc;

use thiserror::Error;

/// Flags controlling how a path is resolved by [`Descriptor::open_at`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathFlags {
    pub symlink_follow: bool,
}

/// Flags controlling what [`Descriptor::open_at`] does with the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Create the file if it does not exist.
    pub create: bool,
    /// Fail unless the target is a directory.
    pub directory: bool,
    /// With `create`, fail if the file already exists.
    pub exclusive: bool,
    /// Truncate an existing file to zero length.
    pub truncate: bool,
}

/// Access rights requested for the opened descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorFlags {
    pub read: bool,
    pub write: bool,
    pub mutate_directory: bool,
}

impl DescriptorFlags {
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Default::default()
        }
    }

    pub fn write_only() -> Self {
        Self {
            write: true,
            ..Default::default()
        }
    }
}

/// Kind of object a descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    Directory,
    RegularFile,
    SymbolicLink,
    Unknown,
}

/// Result of [`Descriptor::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorStat {
    pub kind: DescriptorType,
    pub size: u64,
}

/// One entry from [`Descriptor::read_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub kind: DescriptorType,
    pub name: String,
}

/// Descriptor-level failure codes.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ErrorCode {
    #[error("access denied")]
    Access,
    #[error("bad descriptor")]
    BadDescriptor,
    #[error("file exists")]
    Exist,
    #[error("invalid argument")]
    Invalid,
    #[error("i/o error")]
    Io,
    #[error("is a directory")]
    IsDirectory,
    #[error("no such file or directory")]
    NoEntry,
    #[error("not a directory")]
    NotDirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("operation not permitted")]
    NotPermitted,
    #[error("read-only file system")]
    ReadOnly,
    #[error("operation not supported")]
    Unsupported,
}

/// An open file or directory handle.
pub trait Descriptor: Send + Sync {
    /// Open `path` relative to this directory.
    fn open_at(
        &self,
        path_flags: PathFlags,
        path: &str,
        open_flags: OpenFlags,
        flags: DescriptorFlags,
    ) -> Result<Box<dyn Descriptor>, ErrorCode>;

    /// Read up to `length` bytes at `offset`. The flag is `true` at end of file.
    fn read(&self, length: u64, offset: u64) -> Result<(Vec<u8>, bool), ErrorCode>;

    /// Write `buffer` at `offset`, returning the number of bytes written.
    fn write(&self, buffer: &[u8], offset: u64) -> Result<u64, ErrorCode>;

    fn stat(&self) -> Result<DescriptorStat, ErrorCode>;

    fn read_directory(&self) -> Result<Vec<DirectoryEntry>, ErrorCode>;
}

/// Directories the host pre-opened for the guest.
pub trait Preopens: Send + Sync {
    /// `(descriptor, guest mount path)` pairs, in host enumeration order.
    fn get_directories(&self) -> Vec<(Arc<dyn Descriptor>, String)>;
}
