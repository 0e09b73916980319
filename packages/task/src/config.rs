//! Task options as users write them, and the canonical configuration the
//! host receives.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Compute budget class for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeTier {
    Low,
    Medium,
    High,
}

impl ComputeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeTier::Low => "LOW",
            ComputeTier::Medium => "MEDIUM",
            ComputeTier::High => "HIGH",
        }
    }
}

/// A compute setting: either a named tier or a numeric level.
///
/// Deserializes from `"low"`, `"HIGH"`, `3` or `2.5`. Names are not checked
/// against the known tiers; the host decides what it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Compute {
    Level(Number),
    Named(String),
}

impl Compute {
    /// Upper-case named tiers, keep levels as they are.
    pub fn normalized(self) -> Self {
        match self {
            Compute::Named(name) => Compute::Named(name.to_uppercase()),
            level => level,
        }
    }
}

impl Default for Compute {
    fn default() -> Self {
        Compute::Named(ComputeTier::Medium.as_str().to_string())
    }
}

impl From<ComputeTier> for Compute {
    fn from(tier: ComputeTier) -> Self {
        Compute::Named(tier.as_str().to_string())
    }
}

impl From<&str> for Compute {
    fn from(name: &str) -> Self {
        Compute::Named(name.to_string())
    }
}

impl From<u64> for Compute {
    fn from(level: u64) -> Self {
        Compute::Level(level.into())
    }
}

/// A timeout as written by the user: milliseconds (any JSON number) or a
/// duration string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timeout {
    Millis(Number),
    Duration(String),
}

impl From<u64> for Timeout {
    fn from(ms: u64) -> Self {
        Timeout::Millis(ms.into())
    }
}

impl From<&str> for Timeout {
    fn from(duration: &str) -> Self {
        Timeout::Duration(duration.to_string())
    }
}

impl From<String> for Timeout {
    fn from(duration: String) -> Self {
        Timeout::Duration(duration)
    }
}

/// Bring a timeout into its single string form.
///
/// Millisecond counts get an `ms` suffix; strings such as `"30s"` pass
/// through untouched, malformed ones included.
pub fn normalize_timeout(timeout: Option<Timeout>) -> Option<String> {
    match timeout? {
        Timeout::Millis(ms) => Some(format!("{}ms", ms)),
        Timeout::Duration(duration) => Some(duration),
    }
}

/// Options supplied when defining a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOptions {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<Compute>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Timeout>,

    #[serde(default, alias = "max_retries", skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, alias = "allowed_files", skip_serializing_if = "Option::is_none")]
    pub allowed_files: Option<Vec<String>>,

    #[serde(default, alias = "allowed_hosts", skip_serializing_if = "Option::is_none")]
    pub allowed_hosts: Option<Vec<String>>,

    #[serde(default, alias = "env_variables", skip_serializing_if = "Option::is_none")]
    pub env_variables: Option<Vec<String>>,
}

impl TaskOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn compute(mut self, compute: impl Into<Compute>) -> Self {
        self.compute = Some(compute.into());
        self
    }

    pub fn ram(mut self, ram: impl Into<String>) -> Self {
        self.ram = Some(ram.into());
        self
    }

    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn allowed_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    pub fn allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    pub fn env_variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_variables = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Produce the canonical configuration.
    pub fn normalize(self) -> TaskConfig {
        TaskConfig {
            name: self.name,
            compute: self.compute.map(Compute::normalized).unwrap_or_default(),
            ram: self.ram,
            timeout: normalize_timeout(self.timeout),
            max_retries: self.max_retries,
            allowed_files: self.allowed_files,
            allowed_hosts: self.allowed_hosts,
            env_variables: self.env_variables,
        }
    }
}

/// Canonical task configuration.
///
/// Serializes to the wire form the host expects as `configJson`: camelCase
/// keys, unset options omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    pub name: String,

    #[serde(default)]
    pub compute: Compute,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_files: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_hosts: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_variables: Option<Vec<String>>,
}

impl From<TaskOptions> for TaskConfig {
    fn from(options: TaskOptions) -> Self {
        options.normalize()
    }
}
