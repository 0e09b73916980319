//! Ways of actually sending a prepared request.

use std::sync::Arc;

use async_trait::async_trait;
use capsule_host::HostHttp;
use indexmap::IndexMap;

use crate::error::Result;
use crate::types::{PreparedRequest, Response};

/// Sends prepared requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &PreparedRequest) -> Result<Response>;
}

/// Sends requests through the host's `http-request` primitive.
///
/// The call blocks until the host has the response.
#[derive(Clone)]
pub struct HostTransport {
    http: Arc<dyn HostHttp>,
}

impl HostTransport {
    pub fn new(http: Arc<dyn HostHttp>) -> Self {
        Self { http }
    }

    pub fn send(&self, request: &PreparedRequest) -> Result<Response> {
        let reply = self.http.http_request(
            request.method.as_str(),
            &request.url,
            &request.header_pairs(),
            request.body.as_deref(),
        )?;

        let headers: IndexMap<String, String> = reply.headers.into_iter().collect();
        Ok(Response::new(reply.status, headers, reply.body))
    }
}

#[async_trait]
impl HttpTransport for HostTransport {
    async fn execute(&self, request: &PreparedRequest) -> Result<Response> {
        self.send(request)
    }
}

#[cfg(feature = "native")]
pub use native::ReqwestTransport;

#[cfg(feature = "native")]
mod native {
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use reqwest::Client;
    use url::Url;

    use super::*;
    use crate::config::HttpConfig;

    /// Direct network transport using reqwest.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new(config: &HttpConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(config.timeout())
                .user_agent(config.user_agent.clone())
                .build()?;
            Ok(Self { client })
        }

        pub fn with_default_config() -> Result<Self> {
            Self::new(&HttpConfig::default())
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn execute(&self, request: &PreparedRequest) -> Result<Response> {
            let url = Url::parse(&request.url)?;

            let mut headers = HeaderMap::new();
            for (name, value) in &request.headers {
                headers.insert(
                    HeaderName::try_from(name.as_str())?,
                    HeaderValue::try_from(value.as_str())?,
                );
            }

            let mut builder = self
                .client
                .request(request.method.into(), url)
                .headers(headers);
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();

            let mut resp_headers = IndexMap::new();
            for (name, value) in response.headers() {
                if let Ok(v) = value.to_str() {
                    resp_headers.insert(name.to_string(), v.to_string());
                }
            }

            let body = response.text().await?;
            Ok(Response::new(status, resp_headers, body))
        }
    }
}
