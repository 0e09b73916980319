//! The `capsule:host/api` interface as seen from the guest.

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Schedules a task in a new isolated instance and blocks until it finishes.
///
/// `args_json` is a JSON array of positional arguments and `config_json` the
/// task's wire configuration. The returned string is whatever the spawned
/// instance's entrypoint produced, typically `{"result": ...}`.
pub trait TaskScheduler: Send + Sync {
    fn schedule_task(
        &self,
        name: &str,
        args_json: &str,
        config_json: &str,
    ) -> Result<String, HostError>;
}

/// Host-mediated HTTP primitive.
///
/// Headers travel as an ordered list of pairs in both directions.
pub trait HostHttp: Send + Sync {
    fn http_request(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<&str>,
    ) -> Result<HostHttpResponse, HostError>;
}

/// Response returned by [`HostHttp::http_request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHttpResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: String,
}
