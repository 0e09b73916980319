//! Name → task mapping kept in registration order.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::config::TaskConfig;
use crate::task::TaskFn;

/// A registered task: the callable and its configuration.
#[derive(Clone)]
pub struct TaskInfo {
    pub func: Arc<dyn TaskFn>,
    pub config: TaskConfig,
}

/// Registered tasks, in the order they were first defined.
///
/// Registering an existing name replaces its entry in place, so the name
/// keeps its original position. There is no removal.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: RwLock<IndexMap<String, TaskInfo>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, func: Arc<dyn TaskFn>, config: TaskConfig) {
        let name = name.into();
        let replaced = self
            .tasks
            .write()
            .insert(name.clone(), TaskInfo { func, config })
            .is_some();
        if replaced {
            tracing::debug!(task = %name, "task re-registered");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TaskFn>> {
        self.tasks.read().get(name).map(|info| info.func.clone())
    }

    pub fn get_config(&self, name: &str) -> Option<TaskConfig> {
        self.tasks.read().get(name).map(|info| info.config.clone())
    }

    pub fn get_info(&self, name: &str) -> Option<TaskInfo> {
        self.tasks.read().get(name).cloned()
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tasks.read().keys().cloned().collect()
    }

    /// The earliest registered task.
    pub fn first(&self) -> Option<(String, Arc<dyn TaskFn>)> {
        self.tasks
            .read()
            .first()
            .map(|(name, info)| (name.clone(), info.func.clone()))
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.names())
            .finish()
    }
}
