//! File access through the host's preopened directories.

use std::sync::Arc;

use capsule_host::{Descriptor, DescriptorFlags, HostImports, OpenFlags, PathFlags};

use crate::error::{FsError, Result};
use crate::resolver::{resolve, ResolvedPath};

const READ: &str = "read file";
const WRITE: &str = "write file";
const LIST: &str = "list directory";

/// Upper bound on the buffer reserved up front from the reported file size.
const INITIAL_READ_CAPACITY: u64 = 64 * 1024;

/// Reads and writes files in the directories the host granted.
///
/// Preopens are looked up again on every call.
#[derive(Clone)]
pub struct Files {
    imports: Arc<dyn HostImports>,
}

impl Files {
    pub fn new(imports: Arc<dyn HostImports>) -> Self {
        Self { imports }
    }

    /// Resolve a guest path against the current preopens.
    pub fn resolve(&self, path: &str) -> Option<ResolvedPath> {
        let preopens = self.imports.preopens()?;
        resolve(&preopens.get_directories(), path)
    }

    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let resolved = self.resolve(path).ok_or(FsError::Unavailable)?;
        read_all(&resolved).map_err(|code| FsError::operation(READ, path, code))
    }

    pub fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes).map_err(|source| FsError::InvalidUtf8 {
            path: path.to_string(),
            source,
        })
    }

    /// Create or truncate `path` and write `data` to it.
    pub fn write_bytes(&self, path: &str, data: &[u8]) -> Result<()> {
        let resolved = self.resolve(path).ok_or(FsError::Unavailable)?;
        write_all(&resolved, data).map_err(|code| FsError::operation(WRITE, path, code))
    }

    pub fn write_text(&self, path: &str, content: &str) -> Result<()> {
        self.write_bytes(path, content.as_bytes())
    }

    /// Names of the entries in a directory.
    pub fn list(&self, path: &str) -> Result<Vec<String>> {
        let resolved = self.resolve(path).ok_or(FsError::Unavailable)?;
        list_names(&resolved).map_err(|code| FsError::operation(LIST, path, code))
    }

    /// List the current directory.
    pub fn list_root(&self) -> Result<Vec<String>> {
        self.list(".")
    }

    /// Whether `path` can be opened. False when no filesystem is available.
    pub fn exists(&self, path: &str) -> bool {
        let Some(resolved) = self.resolve(path) else {
            return false;
        };
        resolved
            .descriptor
            .open_at(
                PathFlags::default(),
                &resolved.relative_path,
                OpenFlags::default(),
                DescriptorFlags::read_only(),
            )
            .is_ok()
    }
}

impl std::fmt::Debug for Files {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Files").finish_non_exhaustive()
    }
}

fn read_all(resolved: &ResolvedPath) -> std::result::Result<Vec<u8>, capsule_host::ErrorCode> {
    let fd = resolved.descriptor.open_at(
        PathFlags::default(),
        &resolved.relative_path,
        OpenFlags::default(),
        DescriptorFlags::read_only(),
    )?;
    let size = fd.stat()?.size;

    let mut data = Vec::with_capacity(size.min(INITIAL_READ_CAPACITY) as usize);
    while (data.len() as u64) < size {
        let offset = data.len() as u64;
        let (chunk, eof) = fd.read(size - offset, offset)?;
        let done = eof || chunk.is_empty();
        data.extend_from_slice(&chunk);
        if done {
            break;
        }
    }
    Ok(data)
}

fn write_all(resolved: &ResolvedPath, data: &[u8]) -> std::result::Result<(), capsule_host::ErrorCode> {
    let fd = resolved.descriptor.open_at(
        PathFlags::default(),
        &resolved.relative_path,
        OpenFlags {
            create: true,
            truncate: true,
            ..Default::default()
        },
        DescriptorFlags::write_only(),
    )?;

    let mut written = 0usize;
    while written < data.len() {
        let n = fd.write(&data[written..], written as u64)?;
        if n == 0 {
            return Err(capsule_host::ErrorCode::Io);
        }
        written += n as usize;
    }
    Ok(())
}

fn list_names(resolved: &ResolvedPath) -> std::result::Result<Vec<String>, capsule_host::ErrorCode> {
    let entries = if resolved.relative_path == "." {
        resolved.descriptor.read_directory()?
    } else {
        let dir: Box<dyn Descriptor> = resolved.descriptor.open_at(
            PathFlags::default(),
            &resolved.relative_path,
            OpenFlags {
                directory: true,
                ..Default::default()
            },
            DescriptorFlags::read_only(),
        )?;
        dir.read_directory()?
    };

    Ok(entries
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| !name.is_empty())
        .collect())
}
