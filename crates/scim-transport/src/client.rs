//! The production [`HttpTransport`] implementation, backed by `reqwest`.

use crate::envelope::HttpResponse;
use crate::error::TransportError;
use crate::headers::Headers;
use crate::HttpTransport;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Cap on 429 retries: 3 retries for a total of 4 attempts (`spec.md` §4.4).
const MAX_RETRIES: u32 = 3;
/// Floor applied to a parsed `Retry-After` value.
const MIN_RETRY_AFTER: Duration = Duration::from_secs(1);
/// Used when `Retry-After` is absent or unparseable.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);

/// Configuration for a [`ReqwestTransport`].
///
/// Mirrors `http_client.py::SCIMClient.__init__` one-to-one: bearer token
/// takes precedence over basic auth when both are supplied; a custom CA
/// bundle takes precedence over `tls_no_verify` when both are set (they are
/// semantically exclusive, but this is the deterministic tie-break).
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Root URL of the SCIM endpoint, e.g. `https://example.com/scim/v2`.
    pub base_url: String,
    /// Bearer token. Takes precedence over `username`/`password`.
    pub token: Option<String>,
    /// HTTP Basic username.
    pub username: Option<String>,
    /// HTTP Basic password.
    pub password: Option<String>,
    /// Skip TLS certificate verification entirely.
    pub tls_no_verify: bool,
    /// Path to a custom CA bundle (PEM). Wins over `tls_no_verify`.
    pub ca_bundle: Option<std::path::PathBuf>,
    /// HTTP/HTTPS proxy URL.
    pub proxy: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TransportConfig {
    /// A config pointed at `base_url` with every other knob at its default
    /// (no auth, TLS verified, no proxy, 30s timeout).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }
}

/// `reqwest`-backed [`HttpTransport`] with 429 retry and auth/TLS/proxy
/// configuration.
pub struct ReqwestTransport {
    config: TransportConfig,
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from `config`, constructing the underlying
    /// `reqwest::Client` once up front.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);

        if let Some(ref path) = config.ca_bundle {
            let pem = std::fs::read(path)
                .map_err(|e| TransportError::InvalidUrl(format!("CA bundle: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| TransportError::InvalidUrl(format!("CA bundle: {e}")))?;
            builder = builder.add_root_certificate(cert);
        } else if config.tls_no_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn default_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept", "application/scim+json");
        headers.insert("Content-Type", "application/scim+json");
        if let Some(ref token) = self.config.token {
            headers.insert("Authorization", format!("Bearer {token}"));
        } else if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            use base64::Engine as _;
            let creds = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
            headers.insert("Authorization", format!("Basic {creds}"));
        }
        headers
    }

    async fn execute(
        &self,
        method: reqwest::Method,
        path: &str,
        payload: Option<&Value>,
        extra_headers: Option<Headers>,
    ) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut headers = self.default_headers();
        if let Some(extra) = extra_headers {
            for (name, value) in extra.iter() {
                headers.insert(name, value);
            }
        }

        let mut attempt = 0u32;
        loop {
            let mut req = self.client.request(method.clone(), &url);
            for (name, value) in headers.iter() {
                req = req.header(name, value);
            }
            if let Some(body) = payload {
                req = req.json(body);
            }

            debug!(target: "scim.transport", method = %method, url = %url, attempt, "sending request");

            let resp = req.send().await.map_err(TransportError::from_reqwest)?;
            let status = resp.status().as_u16();
            let mut resp_headers = Headers::new();
            for (name, value) in resp.headers().iter() {
                if let Ok(v) = value.to_str() {
                    resp_headers.insert(name.as_str(), v);
                }
            }
            let body_text = resp.text().await.ok();

            if status == 429 && attempt < MAX_RETRIES {
                let wait = parse_retry_after(resp_headers.get("Retry-After"));
                warn!(
                    target: "scim.transport",
                    url = %url,
                    attempt,
                    wait_secs = wait.as_secs(),
                    "429 received, retrying after backoff"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            return Ok(HttpResponse::new(status, resp_headers, body_text));
        }
    }
}

/// Parse a `Retry-After` header value (integer seconds) into a sleep
/// duration, floored at 1 second and defaulting to 2 seconds when absent
/// or unparseable (`spec.md` §4.4).
fn parse_retry_after(value: Option<&str>) -> Duration {
    match value.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(secs) => Duration::from_secs(secs).max(MIN_RETRY_AFTER),
        None => DEFAULT_RETRY_AFTER,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.execute(reqwest::Method::GET, path, None, None).await
    }

    async fn post(
        &self,
        path: &str,
        payload: &Value,
        extra_headers: Option<Headers>,
    ) -> Result<HttpResponse, TransportError> {
        self.execute(reqwest::Method::POST, path, Some(payload), extra_headers)
            .await
    }

    async fn put(&self, path: &str, payload: &Value) -> Result<HttpResponse, TransportError> {
        self.execute(reqwest::Method::PUT, path, Some(payload), None)
            .await
    }

    async fn patch(&self, path: &str, payload: &Value) -> Result<HttpResponse, TransportError> {
        self.execute(reqwest::Method::PATCH, path, Some(payload), None)
            .await
    }

    async fn delete(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.execute(reqwest::Method::DELETE, path, None, None)
            .await
    }
}
