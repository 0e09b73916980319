use capsule_host::HostError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "native")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Hosted, but the host does not expose its HTTP primitive.
    #[error("HTTP request failed: Host HTTP API not available")]
    HostUnavailable,

    /// The host's HTTP primitive raised.
    #[error("HTTP request failed: {0}")]
    Host(#[from] HostError),

    /// Running locally without a direct transport.
    #[error("HTTP request failed: no local transport configured")]
    LocalUnavailable,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
