//! Mode-aware HTTP client.

use std::sync::Arc;

use capsule_host::HostBridge;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::transport::{HostTransport, HttpTransport};
use crate::types::{Method, PreparedRequest, RequestOptions, Response};

/// Sends requests directly when local and through the host when hosted.
///
/// The mode comes from the [`HostBridge`]. In hosted mode the host's HTTP
/// primitive is looked up per request; if it is missing the request fails
/// rather than going out directly.
#[derive(Clone)]
pub struct HttpClient {
    bridge: Arc<HostBridge>,
    local: Option<Arc<dyn HttpTransport>>,
}

impl HttpClient {
    /// A client whose local transport is reqwest, configured from `config`.
    #[cfg(feature = "native")]
    pub fn new(bridge: Arc<HostBridge>, config: &HttpConfig) -> Result<Self> {
        let transport = crate::transport::ReqwestTransport::new(config)?;
        Ok(Self::with_local_transport(bridge, Arc::new(transport)))
    }

    /// A client with no direct transport; local requests fail.
    #[cfg(not(feature = "native"))]
    pub fn new(bridge: Arc<HostBridge>, _config: &HttpConfig) -> Result<Self> {
        Ok(Self::host_only(bridge))
    }

    pub fn with_local_transport(bridge: Arc<HostBridge>, local: Arc<dyn HttpTransport>) -> Self {
        Self {
            bridge,
            local: Some(local),
        }
    }

    pub fn host_only(bridge: Arc<HostBridge>) -> Self {
        Self {
            bridge,
            local: None,
        }
    }

    pub async fn request(&self, method: Method, url: &str, options: RequestOptions) -> Result<Response> {
        let request = PreparedRequest::new(method, url, options);
        let hosted = self.bridge.is_hosted();
        tracing::debug!(%method, url, hosted, "sending http request");

        if hosted {
            let http = self.bridge.imports().http().ok_or(Error::HostUnavailable)?;
            return HostTransport::new(http).send(&request);
        }

        match &self.local {
            Some(transport) => transport.execute(&request).await,
            None => Err(Error::LocalUnavailable),
        }
    }

    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::GET, url, options).await
    }

    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::POST, url, options).await
    }

    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::PUT, url, options).await
    }

    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::DELETE, url, options).await
    }

    pub async fn patch(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::PATCH, url, options).await
    }

    pub async fn head(&self, url: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::HEAD, url, options).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("bridge", &self.bridge)
            .field("local", &self.local.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use capsule_host::testing::{MockHostHttp, MockScheduler};
    use capsule_host::{HostHttpResponse, Imports};
    use serde_json::json;

    fn local_bridge() -> Arc<HostBridge> {
        Arc::new(HostBridge::new(Arc::new(Imports::none())))
    }

    fn hosted_imports() -> Imports {
        Imports::none().with_scheduler(Arc::new(MockScheduler::new()))
    }

    fn host_reply(status: u16) -> HostHttpResponse {
        HostHttpResponse {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: "from host".to_string(),
        }
    }

    #[tokio::test]
    async fn local_mode_uses_local_transport() {
        let local = Arc::new(MockTransport::new(200));
        let client = HttpClient::with_local_transport(local_bridge(), local.clone());

        let response = client
            .post(
                "https://api.example.com/echo",
                RequestOptions::new().with_json_value(json!({"a": 1})),
            )
            .await
            .unwrap();

        assert_eq!(response.text(), "local");
        let recorded = local.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, Method::POST);
        assert_eq!(
            recorded[0].headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn hosted_mode_uses_host_primitive() {
        let host = Arc::new(MockHostHttp::responding(host_reply(202)));
        let imports = hosted_imports().with_http(host.clone());
        let bridge = Arc::new(HostBridge::new(Arc::new(imports)));
        let local = Arc::new(MockTransport::new(200));
        let client = HttpClient::with_local_transport(bridge, local.clone());

        let response = client.get("https://example.com", RequestOptions::new()).await.unwrap();

        assert_eq!(response.status, 202);
        assert_eq!(response.text(), "from host");
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(host.calls()[0].method, "GET");
        assert!(local.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn hosted_without_primitive_fails_without_local_fetch() {
        let bridge = Arc::new(HostBridge::new(Arc::new(hosted_imports())));
        let local = Arc::new(MockTransport::new(200));
        let client = HttpClient::with_local_transport(bridge, local.clone());

        let err = client
            .get("https://example.com", RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::HostUnavailable));
        assert_eq!(
            err.to_string(),
            "HTTP request failed: Host HTTP API not available"
        );
        assert!(local.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn convenience_methods_set_the_method() {
        let local = Arc::new(MockTransport::new(204));
        let client = HttpClient::with_local_transport(local_bridge(), local.clone());
        let url = "https://example.com/r";

        client.get(url, RequestOptions::new()).await.unwrap();
        client.post(url, RequestOptions::new()).await.unwrap();
        client.put(url, RequestOptions::new()).await.unwrap();
        client.delete(url, RequestOptions::new()).await.unwrap();
        client.patch(url, RequestOptions::new()).await.unwrap();
        client.head(url, RequestOptions::new()).await.unwrap();

        let methods: Vec<Method> = local
            .recorded_requests()
            .into_iter()
            .map(|r| r.method)
            .collect();
        assert_eq!(
            methods,
            vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::HEAD
            ]
        );
    }

    #[tokio::test]
    async fn host_only_client_fails_locally() {
        let client = HttpClient::host_only(local_bridge());
        let err = client
            .get("https://example.com", RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LocalUnavailable));
    }
}
