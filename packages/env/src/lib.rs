//! # capsule-env
//!
//! Environment variables, arguments and working directory for Capsule
//! tasks.
//!
//! Inside a sandbox the host only passes the variables named in the task's
//! `env_variables`. Outside one, [`ProcessEnvironment`] exposes the real
//! process environment.

use std::sync::Arc;

use capsule_host::{Environment, HostImports};
use indexmap::IndexMap;

/// Program name reported when the host gives no arguments.
pub const DEFAULT_PROGRAM: &str = "capsule";

/// Working directory reported when the host gives none.
pub const DEFAULT_CWD: &str = "/";

/// Read access to the task's environment.
#[derive(Clone)]
pub struct Env {
    imports: Arc<dyn HostImports>,
}

impl Env {
    pub fn new(imports: Arc<dyn HostImports>) -> Self {
        Self { imports }
    }

    fn environment(&self) -> Option<Arc<dyn Environment>> {
        let environment = self.imports.environment();
        if environment.is_none() {
            tracing::trace!("environment capability not available");
        }
        environment
    }

    /// All variables, in host order. Empty when there is no environment.
    pub fn all(&self) -> IndexMap<String, String> {
        self.environment()
            .map(|env| env.get_environment().into_iter().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.environment()?
            .get_environment()
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Command-line arguments, program name first.
    pub fn args(&self) -> Vec<String> {
        match self.environment() {
            Some(env) => env.get_arguments(),
            None => vec![DEFAULT_PROGRAM.to_string()],
        }
    }

    pub fn cwd(&self) -> String {
        self.environment()
            .and_then(|env| env.initial_cwd())
            .filter(|cwd| !cwd.is_empty())
            .unwrap_or_else(|| DEFAULT_CWD.to_string())
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env").finish_non_exhaustive()
    }
}

/// The current process's environment.
///
/// Variables or arguments that are not valid UTF-8 are converted lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get_environment(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }

    fn get_arguments(&self) -> Vec<String> {
        std::env::args_os()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn initial_cwd(&self) -> Option<String> {
        std::env::current_dir()
            .ok()
            .map(|dir| dir.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_host::testing::StaticEnvironment;
    use capsule_host::Imports;

    fn env_with(environment: StaticEnvironment) -> Env {
        Env::new(Arc::new(
            Imports::none().with_environment(Arc::new(environment)),
        ))
    }

    #[test]
    fn reads_host_variables() {
        let env = env_with(
            StaticEnvironment::new()
                .with_var("API_KEY", "k-123")
                .with_var("REGION", "eu"),
        );

        assert_eq!(env.get("API_KEY").as_deref(), Some("k-123"));
        assert!(env.has("REGION"));
        assert!(!env.has("HOME"));

        let all = env.all();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["API_KEY", "REGION"]);
    }

    #[test]
    fn host_arguments_and_cwd() {
        let env = env_with(
            StaticEnvironment::new()
                .with_args(["main.py", "--verbose"])
                .with_cwd("/workspace"),
        );

        assert_eq!(env.args(), vec!["main.py", "--verbose"]);
        assert_eq!(env.cwd(), "/workspace");
    }

    #[test]
    fn empty_cwd_reports_root() {
        let env = env_with(StaticEnvironment::new().with_cwd(""));
        assert_eq!(env.cwd(), "/");
    }

    #[test]
    fn defaults_without_capability() {
        let env = Env::new(Arc::new(Imports::none()));

        assert!(env.all().is_empty());
        assert_eq!(env.get("PATH"), None);
        assert!(!env.has("PATH"));
        assert_eq!(env.args(), vec!["capsule"]);
        assert_eq!(env.cwd(), "/");
    }

    #[test]
    fn process_environment_sees_the_process() {
        let env = Env::new(Arc::new(
            Imports::none().with_environment(Arc::new(ProcessEnvironment)),
        ));

        assert!(!env.args().is_empty());
        assert_eq!(
            env.cwd(),
            std::env::current_dir().unwrap().to_string_lossy()
        );
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(env.get("PATH"), Some(path));
        }
    }
}
