use capsule_http::HttpConfig;
use serde::{Deserialize, Serialize};

/// Configuration for an [`App`](crate::App).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Direct HTTP transport settings (local mode only).
    pub http: HttpConfig,
}

impl AppConfig {
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}
