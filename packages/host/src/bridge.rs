//! Execution mode detection and task call marshalling.
//!
//! The bridge starts `Unchecked`. The first mode query probes the
//! [`HostImports`] for a task scheduler and moves to `Checked`; the result is
//! kept for the life of the bridge even if the host's imports change later.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::TaskScheduler;
use crate::imports::HostImports;

/// Where task calls are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// A Capsule host is present; task calls are scheduled through it.
    Hosted,
    /// No host; task functions run directly in-process.
    Local,
}

enum ModeState {
    Unchecked,
    Checked {
        mode: ExecutionMode,
        scheduler: Option<Arc<dyn TaskScheduler>>,
    },
}

/// Guest-side end of the host boundary.
pub struct HostBridge {
    imports: Arc<dyn HostImports>,
    state: Mutex<ModeState>,
}

impl HostBridge {
    pub fn new(imports: Arc<dyn HostImports>) -> Self {
        Self {
            imports,
            state: Mutex::new(ModeState::Unchecked),
        }
    }

    /// The capability lookup this bridge was built with.
    pub fn imports(&self) -> &Arc<dyn HostImports> {
        &self.imports
    }

    /// Detect the execution mode, probing the host only on the first call.
    pub fn detect(&self) -> ExecutionMode {
        let mut state = self.state.lock();
        if let ModeState::Checked { mode, .. } = &*state {
            return *mode;
        }

        let scheduler = self.imports.scheduler();
        let mode = if scheduler.is_some() {
            ExecutionMode::Hosted
        } else {
            ExecutionMode::Local
        };
        tracing::debug!(?mode, "capsule execution mode detected");

        *state = ModeState::Checked { mode, scheduler };
        mode
    }

    /// The cached mode, or `None` if nothing has asked yet.
    pub fn checked_mode(&self) -> Option<ExecutionMode> {
        match &*self.state.lock() {
            ModeState::Unchecked => None,
            ModeState::Checked { mode, .. } => Some(*mode),
        }
    }

    pub fn is_hosted(&self) -> bool {
        self.detect() == ExecutionMode::Hosted
    }

    fn scheduler(&self) -> Option<Arc<dyn TaskScheduler>> {
        self.detect();
        match &*self.state.lock() {
            ModeState::Checked { scheduler, .. } => scheduler.clone(),
            ModeState::Unchecked => None,
        }
    }

    /// Ask the host to run `name` in a new isolated instance.
    ///
    /// Always returns a JSON string. Host failures come back as
    /// `{"error": "Host call failed: ..."}` instead of an `Err`; outside a
    /// host the reply is a mock `{"result": "mock_result_for_<name>"}`.
    pub fn call_host<C>(&self, name: &str, args: &[Value], config: &C) -> String
    where
        C: Serialize + ?Sized,
    {
        let Some(scheduler) = self.scheduler() else {
            return json!({ "result": format!("mock_result_for_{}", name) }).to_string();
        };

        let encoded = serde_json::to_string(args)
            .and_then(|args_json| Ok((args_json, serde_json::to_string(config)?)));
        let (args_json, config_json) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => return host_call_failed(name, &e.to_string()),
        };

        match scheduler.schedule_task(name, &args_json, &config_json) {
            Ok(result) => result,
            Err(e) => host_call_failed(name, &e.to_string()),
        }
    }
}

fn host_call_failed(name: &str, message: &str) -> String {
    tracing::warn!(task = name, error = message, "host call failed");
    json!({ "error": format!("Host call failed: {}", message) }).to_string()
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("mode", &self.checked_mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::api::HostHttp;
    use crate::environment::Environment;
    use crate::filesystem::Preopens;
    use crate::imports::Imports;
    use crate::testing::MockScheduler;

    /// Imports whose scheduler can be switched on and off after construction.
    struct SwitchableImports {
        present: AtomicBool,
        probes: AtomicUsize,
        scheduler: Arc<MockScheduler>,
    }

    impl SwitchableImports {
        fn new(present: bool) -> Self {
            Self {
                present: AtomicBool::new(present),
                probes: AtomicUsize::new(0),
                scheduler: Arc::new(MockScheduler::replying(r#"{"result":"hosted"}"#)),
            }
        }
    }

    impl HostImports for SwitchableImports {
        fn scheduler(&self) -> Option<Arc<dyn TaskScheduler>> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.present.load(Ordering::SeqCst) {
                Some(self.scheduler.clone())
            } else {
                None
            }
        }

        fn http(&self) -> Option<Arc<dyn HostHttp>> {
            None
        }

        fn preopens(&self) -> Option<Arc<dyn Preopens>> {
            None
        }

        fn environment(&self) -> Option<Arc<dyn Environment>> {
            None
        }
    }

    fn hosted_bridge(scheduler: MockScheduler) -> (HostBridge, Arc<MockScheduler>) {
        let scheduler = Arc::new(scheduler);
        let imports = Imports::none().with_scheduler(scheduler.clone());
        (HostBridge::new(Arc::new(imports)), scheduler)
    }

    #[test]
    fn starts_unchecked() {
        let bridge = HostBridge::new(Arc::new(Imports::none()));
        assert_eq!(bridge.checked_mode(), None);
    }

    #[test]
    fn local_without_scheduler() {
        let bridge = HostBridge::new(Arc::new(Imports::none()));
        assert_eq!(bridge.detect(), ExecutionMode::Local);
        assert!(!bridge.is_hosted());
        assert_eq!(bridge.checked_mode(), Some(ExecutionMode::Local));
    }

    #[test]
    fn hosted_with_scheduler() {
        let (bridge, _) = hosted_bridge(MockScheduler::new());
        assert!(bridge.is_hosted());
    }

    #[test]
    fn detection_happens_once() {
        let imports = Arc::new(SwitchableImports::new(false));
        let bridge = HostBridge::new(imports.clone());

        assert!(!bridge.is_hosted());
        imports.present.store(true, Ordering::SeqCst);
        assert!(!bridge.is_hosted());
        assert_eq!(
            bridge.call_host("t", &[], &json!({})),
            r#"{"result":"mock_result_for_t"}"#
        );
        assert_eq!(imports.probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cached_hosted_mode_survives_capability_loss() {
        let imports = Arc::new(SwitchableImports::new(true));
        let bridge = HostBridge::new(imports.clone());

        assert!(bridge.is_hosted());
        imports.present.store(false, Ordering::SeqCst);
        assert!(bridge.is_hosted());
        assert_eq!(bridge.call_host("t", &[], &json!({})), r#"{"result":"hosted"}"#);
    }

    #[test]
    fn local_call_returns_mock_result() {
        let bridge = HostBridge::new(Arc::new(Imports::none()));
        let reply = bridge.call_host("greet", &[json!("World")], &json!({"name": "greet"}));
        assert_eq!(reply, r#"{"result":"mock_result_for_greet"}"#);
    }

    #[test]
    fn hosted_call_marshals_name_args_and_config() {
        let (bridge, scheduler) = hosted_bridge(MockScheduler::replying(r#"{"result":5}"#));

        let reply = bridge.call_host(
            "add",
            &[json!(2), json!(3)],
            &json!({"name": "add", "compute": "LOW"}),
        );

        assert_eq!(reply, r#"{"result":5}"#);
        let calls = scheduler.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "add");
        assert_eq!(calls[0].args_json, "[2,3]");
        let config: Value = serde_json::from_str(&calls[0].config_json).unwrap();
        assert_eq!(config, json!({"name": "add", "compute": "LOW"}));
    }

    #[test]
    fn host_failure_becomes_error_envelope() {
        let (bridge, _) = hosted_bridge(MockScheduler::failing("instance trapped"));

        let reply = bridge.call_host("boom", &[], &json!({}));
        let parsed: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed, json!({"error": "Host call failed: instance trapped"}));
    }
}
