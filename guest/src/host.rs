//! Host capabilities backed by the component's imports.

use std::sync::Arc;

use capsule_host::{
    Descriptor, DescriptorFlags, DescriptorStat, DescriptorType, DirectoryEntry, Environment,
    ErrorCode, HostError, HostHttp, HostHttpResponse, HostImports, OpenFlags, PathFlags,
    Preopens, TaskScheduler,
};
use wasi::filesystem::types as fs;

use crate::capsule::host::api;

/// Everything the `capsule-agent` world imports.
pub struct ComponentImports;

impl HostImports for ComponentImports {
    fn scheduler(&self) -> Option<Arc<dyn TaskScheduler>> {
        Some(Arc::new(ApiScheduler))
    }

    fn http(&self) -> Option<Arc<dyn HostHttp>> {
        Some(Arc::new(ApiHttp))
    }

    fn preopens(&self) -> Option<Arc<dyn Preopens>> {
        Some(Arc::new(WasiPreopens))
    }

    fn environment(&self) -> Option<Arc<dyn Environment>> {
        Some(Arc::new(WasiEnvironment))
    }
}

struct ApiScheduler;

impl TaskScheduler for ApiScheduler {
    fn schedule_task(
        &self,
        name: &str,
        args_json: &str,
        config_json: &str,
    ) -> Result<String, HostError> {
        api::schedule_task(name, args_json, config_json).map_err(|e| match e {
            api::TaskError::InvalidConfig(msg) => HostError::call(format!("invalid config: {}", msg)),
            api::TaskError::Timeout(msg) => HostError::call(format!("timeout: {}", msg)),
            api::TaskError::InternalError(msg) => HostError::call(msg),
        })
    }
}

struct ApiHttp;

impl HostHttp for ApiHttp {
    fn http_request(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<&str>,
    ) -> Result<HostHttpResponse, HostError> {
        let response = api::http_request(method, url, headers, body).map_err(HostError::call)?;
        Ok(HostHttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}

struct WasiEnvironment;

impl Environment for WasiEnvironment {
    fn get_environment(&self) -> Vec<(String, String)> {
        wasi::cli::environment::get_environment()
    }

    fn get_arguments(&self) -> Vec<String> {
        wasi::cli::environment::get_arguments()
    }

    fn initial_cwd(&self) -> Option<String> {
        wasi::cli::environment::initial_cwd()
    }
}

struct WasiPreopens;

impl Preopens for WasiPreopens {
    fn get_directories(&self) -> Vec<(Arc<dyn Descriptor>, String)> {
        wasi::filesystem::preopens::get_directories()
            .into_iter()
            .map(|(descriptor, path)| {
                (Arc::new(WasiDescriptor(descriptor)) as Arc<dyn Descriptor>, path)
            })
            .collect()
    }
}

struct WasiDescriptor(fs::Descriptor);

// SAFETY: components run single-threaded; the handle never crosses threads.
unsafe impl Send for WasiDescriptor {}
unsafe impl Sync for WasiDescriptor {}

impl Descriptor for WasiDescriptor {
    fn open_at(
        &self,
        path_flags: PathFlags,
        path: &str,
        open_flags: OpenFlags,
        flags: DescriptorFlags,
    ) -> Result<Box<dyn Descriptor>, ErrorCode> {
        let mut wasi_path_flags = fs::PathFlags::empty();
        if path_flags.symlink_follow {
            wasi_path_flags |= fs::PathFlags::SYMLINK_FOLLOW;
        }

        let mut wasi_open_flags = fs::OpenFlags::empty();
        if open_flags.create {
            wasi_open_flags |= fs::OpenFlags::CREATE;
        }
        if open_flags.directory {
            wasi_open_flags |= fs::OpenFlags::DIRECTORY;
        }
        if open_flags.exclusive {
            wasi_open_flags |= fs::OpenFlags::EXCLUSIVE;
        }
        if open_flags.truncate {
            wasi_open_flags |= fs::OpenFlags::TRUNCATE;
        }

        let mut wasi_flags = fs::DescriptorFlags::empty();
        if flags.read {
            wasi_flags |= fs::DescriptorFlags::READ;
        }
        if flags.write {
            wasi_flags |= fs::DescriptorFlags::WRITE;
        }
        if flags.mutate_directory {
            wasi_flags |= fs::DescriptorFlags::MUTATE_DIRECTORY;
        }

        let opened = self
            .0
            .open_at(wasi_path_flags, path, wasi_open_flags, wasi_flags)
            .map_err(error_code)?;
        Ok(Box::new(WasiDescriptor(opened)))
    }

    fn read(&self, length: u64, offset: u64) -> Result<(Vec<u8>, bool), ErrorCode> {
        self.0.read(length, offset).map_err(error_code)
    }

    fn write(&self, buffer: &[u8], offset: u64) -> Result<u64, ErrorCode> {
        self.0.write(buffer, offset).map_err(error_code)
    }

    fn stat(&self) -> Result<DescriptorStat, ErrorCode> {
        let stat = self.0.stat().map_err(error_code)?;
        Ok(DescriptorStat {
            kind: descriptor_type(stat.type_),
            size: stat.size,
        })
    }

    fn read_directory(&self) -> Result<Vec<DirectoryEntry>, ErrorCode> {
        let stream = self.0.read_directory().map_err(error_code)?;
        let mut entries = Vec::new();
        while let Some(entry) = stream.read_directory_entry().map_err(error_code)? {
            entries.push(DirectoryEntry {
                kind: descriptor_type(entry.type_),
                name: entry.name,
            });
        }
        Ok(entries)
    }
}

fn descriptor_type(kind: fs::DescriptorType) -> DescriptorType {
    match kind {
        fs::DescriptorType::Directory => DescriptorType::Directory,
        fs::DescriptorType::RegularFile => DescriptorType::RegularFile,
        fs::DescriptorType::SymbolicLink => DescriptorType::SymbolicLink,
        _ => DescriptorType::Unknown,
    }
}

fn error_code(code: fs::ErrorCode) -> ErrorCode {
    match code {
        fs::ErrorCode::Access => ErrorCode::Access,
        fs::ErrorCode::BadDescriptor => ErrorCode::BadDescriptor,
        fs::ErrorCode::Exist => ErrorCode::Exist,
        fs::ErrorCode::Invalid => ErrorCode::Invalid,
        fs::ErrorCode::IsDirectory => ErrorCode::IsDirectory,
        fs::ErrorCode::NoEntry => ErrorCode::NoEntry,
        fs::ErrorCode::NotDirectory => ErrorCode::NotDirectory,
        fs::ErrorCode::NotEmpty => ErrorCode::NotEmpty,
        fs::ErrorCode::NotPermitted => ErrorCode::NotPermitted,
        fs::ErrorCode::ReadOnly => ErrorCode::ReadOnly,
        fs::ErrorCode::Unsupported => ErrorCode::Unsupported,
        _ => ErrorCode::Io,
    }
}
