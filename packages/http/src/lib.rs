//! # capsule-http
//!
//! HTTP client for Capsule tasks.
//!
//! One API, two transports:
//!
//! - **Local mode**: requests go straight to the network through reqwest
//!   (the `native` feature, on by default).
//! - **Hosted mode**: requests are handed to the host's `http-request`
//!   primitive, which applies the task's `allowed_hosts` policy. Headers
//!   travel as an ordered list of pairs.
//!
//! Either way the result is a [`Response`] with `status`, `headers` and
//! `body`, plus `json()`, `text()` and `ok()`.
//!
//! ```ignore
//! use capsule_http::{HttpClient, HttpConfig, RequestOptions};
//!
//! let client = HttpClient::new(bridge, &HttpConfig::default())?;
//! let response = client
//!     .post("https://api.example.com/items", RequestOptions::new().with_json(&item)?)
//!     .await?;
//! if response.ok() {
//!     let created: Item = response.json()?;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::HttpClient;
pub use config::HttpConfig;
pub use error::{Error, Result};
#[cfg(feature = "native")]
pub use transport::ReqwestTransport;
pub use transport::{HostTransport, HttpTransport};
pub use types::{Method, PreparedRequest, RequestOptions, Response};
