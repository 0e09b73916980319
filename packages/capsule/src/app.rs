use std::sync::Arc;

use capsule_env::{Env, ProcessEnvironment};
use capsule_fs::{Files, LocalPreopens};
use capsule_host::{HostBridge, HostImports, Imports};
use capsule_http::HttpClient;
use capsule_task::{
    Kwargs, ResultEnvelope, SyncTask, Task, TaskFn, TaskOptions, TaskRegistry, TaskRequest,
    TaskResult, TaskRunner,
};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::Result;

/// One guest's task registry plus the host-facing APIs, wired together.
///
/// Tasks are defined on the app before anything is dispatched. The
/// registry and the bridge are shared with every [`Task`] the app hands out.
pub struct App {
    config: AppConfig,
    registry: Arc<TaskRegistry>,
    bridge: Arc<HostBridge>,
    runner: TaskRunner,
    files: Files,
    http: HttpClient,
    env: Env,
}

impl App {
    pub fn new(imports: Arc<dyn HostImports>) -> Result<Self> {
        Self::with_config(imports, AppConfig::default())
    }

    pub fn with_config(imports: Arc<dyn HostImports>, config: AppConfig) -> Result<Self> {
        let registry = Arc::new(TaskRegistry::new());
        let bridge = Arc::new(HostBridge::new(imports.clone()));
        let http = HttpClient::new(bridge.clone(), &config.http)?;

        Ok(Self {
            runner: TaskRunner::new(registry.clone()),
            files: Files::new(imports.clone()),
            env: Env::new(imports),
            config,
            registry,
            bridge,
            http,
        })
    }

    /// An app for a plain native process: no scheduler, the working
    /// directory mounted as `"."` and the process environment.
    pub fn local() -> Result<Self> {
        let preopens = LocalPreopens::current_dir()?;
        tracing::debug!(?preopens, "capsule app running against the local process");
        let imports = Imports::none()
            .with_preopens(Arc::new(preopens))
            .with_environment(Arc::new(ProcessEnvironment));
        Self::new(Arc::new(imports))
    }

    /// Define a task and register it.
    pub fn task(&self, options: TaskOptions, func: Arc<dyn TaskFn>) -> Task {
        let task = Task::define(&self.registry, self.bridge.clone(), options, func);
        tracing::trace!(task = task.name(), "task defined");
        task
    }

    /// Define a task from a synchronous closure.
    pub fn task_fn<F>(&self, options: TaskOptions, f: F) -> Task
    where
        F: Fn(Vec<Value>, Kwargs) -> TaskResult + Send + Sync + 'static,
    {
        self.task(options, SyncTask::shared(f))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn bridge(&self) -> &Arc<HostBridge> {
        &self.bridge
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn is_hosted(&self) -> bool {
        self.bridge.is_hosted()
    }

    /// The guest entrypoint. See [`TaskRunner::run`].
    pub async fn run(&self, args_json: &str) -> std::result::Result<String, String> {
        self.runner.run(args_json).await
    }

    /// Run a task in-process and report it as a result envelope.
    pub async fn invoke(&self, name: &str, args: Vec<Value>, kwargs: Kwargs) -> ResultEnvelope {
        let request = TaskRequest::new(name).with_args(args).with_kwargs(kwargs);
        self.runner.invoke(request).await
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("bridge", &self.bridge)
            .finish()
    }
}
