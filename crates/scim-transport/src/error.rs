use scim_error::{ErrorCode, ScimError};
use std::error::Error as _;

/// A transport-layer failure: the request never produced an HTTP response.
///
/// Distinct from a server-reported error status (4xx/5xx), which is a
/// normal [`crate::HttpResponse`] handed back to the caller. A
/// [`TransportError`] means the orchestrator gets no response at all and
/// must record the step as `ERROR` rather than `FAIL`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// TCP connection could not be established.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    /// Request exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// TLS handshake or certificate validation failed. Never retried.
    #[error("TLS failure: {0}")]
    Tls(String),
    /// DNS resolution failed for the target host.
    #[error("DNS resolution failed: {0}")]
    Dns(String),
    /// The configured base URL or request path is not a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Any other transport-layer failure not covered above.
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Classify a [`reqwest::Error`] into the narrower [`TransportError`]
    /// taxonomy the orchestrator reasons about.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            if err.to_string().to_ascii_lowercase().contains("dns") {
                Self::Dns(err.to_string())
            } else {
                Self::ConnectionRefused(err.to_string())
            }
        } else if err
            .source()
            .map(|s| s.to_string().to_ascii_lowercase().contains("tls") || s.to_string().to_ascii_lowercase().contains("certificate"))
            .unwrap_or(false)
        {
            Self::Tls(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

impl From<TransportError> for ScimError {
    fn from(err: TransportError) -> Self {
        let code = match &err {
            TransportError::ConnectionRefused(_) => ErrorCode::TransportConnectionRefused,
            TransportError::Timeout(_) => ErrorCode::TransportTimeout,
            TransportError::Tls(_) => ErrorCode::TransportTlsFailure,
            TransportError::Dns(_) => ErrorCode::TransportDnsFailure,
            TransportError::InvalidUrl(_) => ErrorCode::TransportInvalidUrl,
            TransportError::Other(_) => ErrorCode::Internal,
        };
        ScimError::new(code, err.to_string())
    }
}
