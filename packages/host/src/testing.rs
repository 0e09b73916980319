//! In-memory host capabilities for tests.
//!
//! Enabled inside this crate's tests and, for other crates, through the
//! `test-utils` feature.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::{HostHttp, HostHttpResponse, TaskScheduler};
use crate::environment::Environment;
use crate::error::HostError;
use crate::filesystem::{
    Descriptor, DescriptorFlags, DescriptorStat, DescriptorType, DirectoryEntry, ErrorCode,
    OpenFlags, PathFlags, Preopens,
};

/// A recorded `schedule_task` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCall {
    pub name: String,
    pub args_json: String,
    pub config_json: String,
}

/// Scheduler that records calls and replies with a canned result.
#[derive(Default)]
pub struct MockScheduler {
    reply: Option<Result<String, HostError>>,
    calls: Mutex<Vec<ScheduledCall>>,
}

impl MockScheduler {
    /// Replies `{"result": null}` to every call.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(result_json: impl Into<String>) -> Self {
        Self {
            reply: Some(Ok(result_json.into())),
            ..Default::default()
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Some(Err(HostError::call(message))),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ScheduledCall> {
        self.calls.lock().clone()
    }
}

impl TaskScheduler for MockScheduler {
    fn schedule_task(
        &self,
        name: &str,
        args_json: &str,
        config_json: &str,
    ) -> Result<String, HostError> {
        self.calls.lock().push(ScheduledCall {
            name: name.to_string(),
            args_json: args_json.to_string(),
            config_json: config_json.to_string(),
        });
        self.reply
            .clone()
            .unwrap_or_else(|| Ok(r#"{"result":null}"#.to_string()))
    }
}

/// A recorded `http_request` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostHttpCall {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Host HTTP primitive that records requests and returns a fixed response.
pub struct MockHostHttp {
    reply: Result<HostHttpResponse, HostError>,
    calls: Mutex<Vec<HostHttpCall>>,
}

impl MockHostHttp {
    pub fn responding(response: HostHttpResponse) -> Self {
        Self {
            reply: Ok(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(HostError::call(message)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HostHttpCall> {
        self.calls.lock().clone()
    }
}

impl HostHttp for MockHostHttp {
    fn http_request(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<&str>,
    ) -> Result<HostHttpResponse, HostError> {
        self.calls.lock().push(HostHttpCall {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.to_vec(),
            body: body.map(str::to_string),
        });
        self.reply.clone()
    }
}

/// Environment with fixed contents.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: Vec<(String, String)>,
    args: Vec<String>,
    cwd: Option<String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn get_environment(&self) -> Vec<(String, String)> {
        self.vars.clone()
    }

    fn get_arguments(&self) -> Vec<String> {
        self.args.clone()
    }

    fn initial_cwd(&self) -> Option<String> {
        self.cwd.clone()
    }
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

type Tree = Arc<Mutex<BTreeMap<String, Node>>>;

/// An in-memory directory tree usable as a preopened descriptor.
///
/// Paths inside the tree are stored relative to the tree root, joined with
/// `/`. Every descriptor opened from the tree shares the same storage.
#[derive(Clone)]
pub struct MemoryDirectory {
    tree: Tree,
    path: String,
    flags: DescriptorFlags,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDirectory {
    pub fn new() -> Self {
        let mut tree = BTreeMap::new();
        tree.insert(String::new(), Node::Dir);
        Self {
            tree: Arc::new(Mutex::new(tree)),
            path: String::new(),
            flags: DescriptorFlags {
                read: true,
                write: true,
                mutate_directory: true,
            },
        }
    }

    /// Add a file, creating parent directories as needed.
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        {
            let mut tree = self.tree.lock();
            let parts: Vec<&str> = split(path).collect();
            for depth in 1..parts.len() {
                tree.insert(parts[..depth].join("/"), Node::Dir);
            }
            tree.insert(parts.join("/"), Node::File(contents.into()));
        }
        self
    }

    /// Add an empty directory, creating parents as needed.
    pub fn with_dir(self, path: &str) -> Self {
        {
            let mut tree = self.tree.lock();
            let parts: Vec<&str> = split(path).collect();
            for depth in 1..=parts.len() {
                tree.insert(parts[..depth].join("/"), Node::Dir);
            }
        }
        self
    }

    /// Contents of a file in the tree, for assertions.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let key = split(path).collect::<Vec<_>>().join("/");
        match self.tree.lock().get(&key) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    fn resolve(&self, path: &str) -> Result<String, ErrorCode> {
        if path.starts_with('/') {
            return Err(ErrorCode::NotPermitted);
        }
        let mut parts: Vec<&str> = split(&self.path).collect();
        for part in split(path) {
            if part == ".." {
                parts.pop().ok_or(ErrorCode::NotPermitted)?;
            } else {
                parts.push(part);
            }
        }
        Ok(parts.join("/"))
    }

    fn parent_of(key: &str) -> String {
        match key.rfind('/') {
            Some(index) => key[..index].to_string(),
            None => String::new(),
        }
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty() && *part != ".")
}

impl Descriptor for MemoryDirectory {
    fn open_at(
        &self,
        _path_flags: PathFlags,
        path: &str,
        open_flags: OpenFlags,
        flags: DescriptorFlags,
    ) -> Result<Box<dyn Descriptor>, ErrorCode> {
        let key = self.resolve(path)?;
        let mut tree = self.tree.lock();

        match tree.get(&key).cloned() {
            Some(_) if open_flags.create && open_flags.exclusive => return Err(ErrorCode::Exist),
            Some(Node::File(_)) if open_flags.directory => return Err(ErrorCode::NotDirectory),
            Some(Node::File(_)) if open_flags.truncate => {
                tree.insert(key.clone(), Node::File(Vec::new()));
            }
            Some(_) => {}
            None if open_flags.create => {
                match tree.get(&Self::parent_of(&key)) {
                    Some(Node::Dir) => {}
                    Some(Node::File(_)) => return Err(ErrorCode::NotDirectory),
                    None => return Err(ErrorCode::NoEntry),
                }
                tree.insert(key.clone(), Node::File(Vec::new()));
            }
            None => return Err(ErrorCode::NoEntry),
        }

        Ok(Box::new(MemoryDirectory {
            tree: self.tree.clone(),
            path: key,
            flags,
        }))
    }

    fn read(&self, length: u64, offset: u64) -> Result<(Vec<u8>, bool), ErrorCode> {
        if !self.flags.read {
            return Err(ErrorCode::BadDescriptor);
        }
        match self.tree.lock().get(&self.path) {
            Some(Node::File(data)) => {
                let start = (offset as usize).min(data.len());
                let end = start.saturating_add(length as usize).min(data.len());
                Ok((data[start..end].to_vec(), end == data.len()))
            }
            Some(Node::Dir) => Err(ErrorCode::IsDirectory),
            None => Err(ErrorCode::BadDescriptor),
        }
    }

    fn write(&self, buffer: &[u8], offset: u64) -> Result<u64, ErrorCode> {
        if !self.flags.write {
            return Err(ErrorCode::BadDescriptor);
        }
        match self.tree.lock().get_mut(&self.path) {
            Some(Node::File(data)) => {
                let start = offset as usize;
                if data.len() < start + buffer.len() {
                    data.resize(start + buffer.len(), 0);
                }
                data[start..start + buffer.len()].copy_from_slice(buffer);
                Ok(buffer.len() as u64)
            }
            Some(Node::Dir) => Err(ErrorCode::IsDirectory),
            None => Err(ErrorCode::BadDescriptor),
        }
    }

    fn stat(&self) -> Result<DescriptorStat, ErrorCode> {
        match self.tree.lock().get(&self.path) {
            Some(Node::File(data)) => Ok(DescriptorStat {
                kind: DescriptorType::RegularFile,
                size: data.len() as u64,
            }),
            Some(Node::Dir) => Ok(DescriptorStat {
                kind: DescriptorType::Directory,
                size: 0,
            }),
            None => Err(ErrorCode::BadDescriptor),
        }
    }

    fn read_directory(&self) -> Result<Vec<DirectoryEntry>, ErrorCode> {
        let tree = self.tree.lock();
        match tree.get(&self.path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => return Err(ErrorCode::NotDirectory),
            None => return Err(ErrorCode::BadDescriptor),
        }

        let entries = tree
            .iter()
            .filter(|(key, _)| !key.is_empty() && Self::parent_of(key) == self.path)
            .map(|(key, node)| DirectoryEntry {
                kind: match node {
                    Node::File(_) => DescriptorType::RegularFile,
                    Node::Dir => DescriptorType::Directory,
                },
                name: key.rsplit('/').next().unwrap_or(key).to_string(),
            })
            .collect();
        Ok(entries)
    }
}

/// Preopens backed by a fixed list of mounts.
#[derive(Default, Clone)]
pub struct MemoryPreopens {
    mounts: Vec<(Arc<dyn Descriptor>, String)>,
}

impl MemoryPreopens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(mut self, guest_path: impl Into<String>, dir: Arc<dyn Descriptor>) -> Self {
        self.mounts.push((dir, guest_path.into()));
        self
    }
}

impl Preopens for MemoryPreopens {
    fn get_directories(&self) -> Vec<(Arc<dyn Descriptor>, String)> {
        self.mounts.clone()
    }
}
