//! Preopens backed by the local filesystem.
//!
//! Lets the file API work in a plain native process, where no host grants
//! directories. Each mount maps a guest path onto a host directory; paths
//! opened below it may not leave that directory, through `..` or through a
//! symlink.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use capsule_host::{
    Descriptor, DescriptorFlags, DescriptorStat, DescriptorType, DirectoryEntry, ErrorCode,
    OpenFlags, PathFlags, Preopens,
};
use parking_lot::Mutex;

/// A set of host directories exposed under guest mount paths.
#[derive(Debug, Clone, Default)]
pub struct LocalPreopens {
    mounts: Vec<(PathBuf, String)>,
}

impl LocalPreopens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `host_dir` under `guest_path`.
    pub fn mount(mut self, guest_path: impl Into<String>, host_dir: impl Into<PathBuf>) -> Self {
        self.mounts.push((host_dir.into(), guest_path.into()));
        self
    }

    /// The process working directory mounted as `"."`.
    pub fn current_dir() -> io::Result<Self> {
        Ok(Self::new().mount(".", std::env::current_dir()?))
    }
}

impl Preopens for LocalPreopens {
    fn get_directories(&self) -> Vec<(Arc<dyn Descriptor>, String)> {
        self.mounts
            .iter()
            .map(|(host_dir, guest_path)| {
                let dir: Arc<dyn Descriptor> = Arc::new(LocalDescriptor::root(host_dir.clone()));
                (dir, guest_path.clone())
            })
            .collect()
    }
}

/// A file or directory below a mount root.
pub struct LocalDescriptor {
    root: Arc<PathBuf>,
    relative: PathBuf,
    flags: DescriptorFlags,
    file: Option<Mutex<File>>,
}

impl LocalDescriptor {
    /// The mount root itself, readable and writable.
    pub fn root(dir: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(dir.into()),
            relative: PathBuf::new(),
            flags: DescriptorFlags {
                read: true,
                write: true,
                mutate_directory: true,
            },
            file: None,
        }
    }

    fn full_path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    /// Join `path` onto this descriptor without leaving the mount root.
    fn join(&self, path: &str) -> Result<PathBuf, ErrorCode> {
        let mut joined = self.relative.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => joined.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !joined.pop() {
                        return Err(ErrorCode::NotPermitted);
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(ErrorCode::NotPermitted),
            }
        }
        Ok(joined)
    }

    /// Resolve symlinks in `full` and refuse anything that lands outside
    /// the mount root. A missing final component is checked via its parent.
    fn confine(&self, full: &Path) -> Result<PathBuf, ErrorCode> {
        let root = std::fs::canonicalize(self.root.as_path()).map_err(|e| error_code(&e))?;
        let resolved = match std::fs::canonicalize(full) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (full.parent(), full.file_name()) else {
                    return Err(ErrorCode::NoEntry);
                };
                std::fs::canonicalize(parent)
                    .map_err(|e| error_code(&e))?
                    .join(name)
            }
            Err(e) => return Err(error_code(&e)),
        };
        if resolved.starts_with(&root) {
            Ok(resolved)
        } else {
            Err(ErrorCode::NotPermitted)
        }
    }
}

fn error_code(error: &io::Error) -> ErrorCode {
    match error.kind() {
        io::ErrorKind::NotFound => ErrorCode::NoEntry,
        io::ErrorKind::PermissionDenied => ErrorCode::Access,
        io::ErrorKind::AlreadyExists => ErrorCode::Exist,
        io::ErrorKind::InvalidInput => ErrorCode::Invalid,
        io::ErrorKind::Unsupported => ErrorCode::Unsupported,
        _ => ErrorCode::Io,
    }
}

fn kind_of(file_type: std::fs::FileType) -> DescriptorType {
    if file_type.is_dir() {
        DescriptorType::Directory
    } else if file_type.is_file() {
        DescriptorType::RegularFile
    } else if file_type.is_symlink() {
        DescriptorType::SymbolicLink
    } else {
        DescriptorType::Unknown
    }
}

impl Descriptor for LocalDescriptor {
    fn open_at(
        &self,
        _path_flags: PathFlags,
        path: &str,
        open_flags: OpenFlags,
        flags: DescriptorFlags,
    ) -> Result<Box<dyn Descriptor>, ErrorCode> {
        if self.file.is_some() {
            return Err(ErrorCode::NotDirectory);
        }
        if open_flags.create && open_flags.directory {
            return Err(ErrorCode::Invalid);
        }

        let relative = self.join(path)?;
        let full = self.confine(&self.root.join(&relative))?;

        match std::fs::metadata(&full) {
            Ok(_) if open_flags.create && open_flags.exclusive => return Err(ErrorCode::Exist),
            Ok(metadata) if metadata.is_dir() => {
                return Ok(Box::new(LocalDescriptor {
                    root: self.root.clone(),
                    relative,
                    flags,
                    file: None,
                }));
            }
            Ok(_) if open_flags.directory => return Err(ErrorCode::NotDirectory),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound && open_flags.create => {}
            Err(e) => return Err(error_code(&e)),
        }

        let writable = flags.write || open_flags.create || open_flags.truncate;
        let file = OpenOptions::new()
            .read(flags.read || !writable)
            .write(writable)
            .create(open_flags.create)
            .truncate(open_flags.truncate)
            .open(&full)
            .map_err(|e| error_code(&e))?;

        Ok(Box::new(LocalDescriptor {
            root: self.root.clone(),
            relative,
            flags,
            file: Some(Mutex::new(file)),
        }))
    }

    fn read(&self, length: u64, offset: u64) -> Result<(Vec<u8>, bool), ErrorCode> {
        if !self.flags.read {
            return Err(ErrorCode::BadDescriptor);
        }
        let file = self.file.as_ref().ok_or(ErrorCode::IsDirectory)?;
        let mut file = file.lock();

        let size = file.metadata().map_err(|e| error_code(&e))?.len();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| error_code(&e))?;
        let mut buffer = Vec::new();
        (&mut *file)
            .take(length)
            .read_to_end(&mut buffer)
            .map_err(|e| error_code(&e))?;

        let eof = offset + buffer.len() as u64 >= size;
        Ok((buffer, eof))
    }

    fn write(&self, buffer: &[u8], offset: u64) -> Result<u64, ErrorCode> {
        if !self.flags.write {
            return Err(ErrorCode::BadDescriptor);
        }
        let file = self.file.as_ref().ok_or(ErrorCode::IsDirectory)?;
        let mut file = file.lock();

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| error_code(&e))?;
        file.write_all(buffer).map_err(|e| error_code(&e))?;
        Ok(buffer.len() as u64)
    }

    fn stat(&self) -> Result<DescriptorStat, ErrorCode> {
        let metadata = std::fs::metadata(self.full_path()).map_err(|e| error_code(&e))?;
        Ok(DescriptorStat {
            kind: kind_of(metadata.file_type()),
            size: metadata.len(),
        })
    }

    fn read_directory(&self) -> Result<Vec<DirectoryEntry>, ErrorCode> {
        if self.file.is_some() {
            return Err(ErrorCode::NotDirectory);
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(self.full_path()).map_err(|e| error_code(&e))? {
            let entry = entry.map_err(|e| error_code(&e))?;
            let kind = entry
                .file_type()
                .map(kind_of)
                .unwrap_or(DescriptorType::Unknown);
            entries.push(DirectoryEntry {
                kind,
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl std::fmt::Debug for LocalDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDescriptor")
            .field("path", &self.full_path())
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::Files;
    use capsule_host::Imports;
    use tempfile::TempDir;

    fn files_over(preopens: LocalPreopens) -> Files {
        Files::new(Arc::new(Imports::none().with_preopens(Arc::new(preopens))))
    }

    #[test]
    fn round_trips_text_through_disk() {
        let dir = TempDir::new().unwrap();
        let files = files_over(LocalPreopens::new().mount("data", dir.path()));

        files.write_text("data/notes.txt", "first draft").unwrap();
        files.write_text("data/notes.txt", "final").unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "final"
        );
        assert_eq!(files.read_text("./data/notes.txt").unwrap(), "final");
    }

    #[test]
    fn lists_directories_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/c.txt"), "c").unwrap();

        let files = files_over(LocalPreopens::new().mount(".", dir.path()));
        assert_eq!(files.list(".").unwrap(), vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(files.list("sub").unwrap(), vec!["c.txt"]);
    }

    #[test]
    fn exists_and_missing_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("here.txt"), "x").unwrap();
        let files = files_over(LocalPreopens::new().mount(".", dir.path()));

        assert!(files.exists("here.txt"));
        assert!(!files.exists("gone.txt"));

        let err = files.read_bytes("gone.txt").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NoEntry));
    }

    #[test]
    fn cannot_escape_the_mount() {
        let outer = TempDir::new().unwrap();
        let inner = outer.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(outer.path().join("secret.txt"), "s").unwrap();

        let root = LocalDescriptor::root(&inner);
        let err = root
            .open_at(
                PathFlags::default(),
                "../secret.txt",
                OpenFlags::default(),
                DescriptorFlags::read_only(),
            )
            .err()
            .unwrap();
        assert_eq!(err, ErrorCode::NotPermitted);

        let absolute = outer.path().join("secret.txt");
        assert!(root
            .open_at(
                PathFlags::default(),
                &absolute.to_string_lossy(),
                OpenFlags::default(),
                DescriptorFlags::read_only(),
            )
            .is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_cannot_leave_the_mount() {
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "s").unwrap();
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("secret-link.txt"),
        )
        .unwrap();

        let files = files_over(LocalPreopens::new().mount(".", dir.path()));
        let err = files.read_text("link/secret.txt").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotPermitted));
        let err = files.read_text("secret-link.txt").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotPermitted));
        let err = files.write_text("link/planted.txt", "x").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotPermitted));
        assert!(!outside.path().join("planted.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_inside_the_mount_still_work() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::fs::write(dir.path().join("real/a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();

        let files = files_over(LocalPreopens::new().mount(".", dir.path()));
        assert_eq!(files.read_text("alias/a.txt").unwrap(), "a");
        files.write_text("alias/b.txt", "b").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("real/b.txt")).unwrap(),
            "b"
        );
    }

    #[test]
    fn exclusive_create_fails_on_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("taken"), "x").unwrap();

        let root = LocalDescriptor::root(dir.path());
        let err = root
            .open_at(
                PathFlags::default(),
                "taken",
                OpenFlags {
                    create: true,
                    exclusive: true,
                    ..Default::default()
                },
                DescriptorFlags::write_only(),
            )
            .err()
            .unwrap();
        assert_eq!(err, ErrorCode::Exist);
    }

    #[test]
    fn stat_reports_kind_and_size() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("five"), "12345").unwrap();

        let root = LocalDescriptor::root(dir.path());
        assert_eq!(root.stat().unwrap().kind, DescriptorType::Directory);

        let file = root
            .open_at(
                PathFlags::default(),
                "five",
                OpenFlags::default(),
                DescriptorFlags::read_only(),
            )
            .unwrap();
        let stat = file.stat().unwrap();
        assert_eq!(stat.kind, DescriptorType::RegularFile);
        assert_eq!(stat.size, 5);

        let (head, eof) = file.read(2, 0).unwrap();
        assert_eq!(head, b"12");
        assert!(!eof);
        let (tail, eof) = file.read(10, 2).unwrap();
        assert_eq!(tail, b"345");
        assert!(eof);
    }

    #[test]
    fn current_dir_mounts_dot() {
        let preopens = LocalPreopens::current_dir().unwrap();
        let dirs = preopens.get_directories();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].1, ".");
    }
}
