//! Lookup of the capabilities a host currently exposes.

use std::sync::Arc;

use crate::api::{HostHttp, TaskScheduler};
use crate::environment::Environment;
use crate::filesystem::Preopens;

/// Answers which host capabilities are present.
///
/// Each call reflects the host's current state. Callers decide whether to
/// cache: the [`HostBridge`](crate::HostBridge) probes `scheduler` once, the
/// file and HTTP APIs look up their capability on every operation.
pub trait HostImports: Send + Sync {
    fn scheduler(&self) -> Option<Arc<dyn TaskScheduler>>;
    fn http(&self) -> Option<Arc<dyn HostHttp>>;
    fn preopens(&self) -> Option<Arc<dyn Preopens>>;
    fn environment(&self) -> Option<Arc<dyn Environment>>;
}

/// A fixed set of capabilities.
///
/// `Imports::none()` is what a plain native process sees: nothing, so every
/// bridge built on it runs in local mode.
#[derive(Clone, Default)]
pub struct Imports {
    scheduler: Option<Arc<dyn TaskScheduler>>,
    http: Option<Arc<dyn HostHttp>>,
    preopens: Option<Arc<dyn Preopens>>,
    environment: Option<Arc<dyn Environment>>,
}

impl Imports {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn TaskScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_http(mut self, http: Arc<dyn HostHttp>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_preopens(mut self, preopens: Arc<dyn Preopens>) -> Self {
        self.preopens = Some(preopens);
        self
    }

    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }
}

impl std::fmt::Debug for Imports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Imports")
            .field("scheduler", &self.scheduler.is_some())
            .field("http", &self.http.is_some())
            .field("preopens", &self.preopens.is_some())
            .field("environment", &self.environment.is_some())
            .finish()
    }
}

impl HostImports for Imports {
    fn scheduler(&self) -> Option<Arc<dyn TaskScheduler>> {
        self.scheduler.clone()
    }

    fn http(&self) -> Option<Arc<dyn HostHttp>> {
        self.http.clone()
    }

    fn preopens(&self) -> Option<Arc<dyn Preopens>> {
        self.preopens.clone()
    }

    fn environment(&self) -> Option<Arc<dyn Environment>> {
        self.environment.clone()
    }
}
