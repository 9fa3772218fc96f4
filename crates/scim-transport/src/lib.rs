//! HTTP transport abstraction for SCIM requests.
//!
//! [`HttpTransport`] is the narrow seam the rest of the workspace talks
//! through: five verbs, a uniform [`HttpResponse`] envelope, and nothing
//! else. [`ReqwestTransport`] is the one production implementation; the
//! reference server in `scim-server` is driven over a real socket through
//! the same trait, so probe tests exercise exactly the code path a real
//! run would.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod envelope;
mod error;
mod headers;

pub use client::{ReqwestTransport, TransportConfig};
pub use envelope::HttpResponse;
pub use error::TransportError;
pub use headers::{redact_auth, Headers};

use async_trait::async_trait;
use serde_json::Value;

/// Uniform HTTP transport seam: five verbs, one response envelope.
///
/// Every call that reaches the network returns a [`TransportError`] only
/// when no response was produced at all (connection refused, timeout, TLS
/// failure, DNS failure). Server-reported error statuses (4xx/5xx) are
/// ordinary [`HttpResponse`]s — the caller decides what they mean.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// `GET path`.
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError>;

    /// `POST path` with a JSON body, optionally overriding default headers.
    async fn post(
        &self,
        path: &str,
        payload: &Value,
        extra_headers: Option<Headers>,
    ) -> Result<HttpResponse, TransportError>;

    /// `PUT path` with a JSON body.
    async fn put(&self, path: &str, payload: &Value) -> Result<HttpResponse, TransportError>;

    /// `PATCH path` with a JSON body.
    async fn patch(&self, path: &str, payload: &Value) -> Result<HttpResponse, TransportError>;

    /// `DELETE path` with no body.
    async fn delete(&self, path: &str) -> Result<HttpResponse, TransportError>;
}
