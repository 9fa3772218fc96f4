//! Unified error taxonomy with stable error codes for scim-sanity.
//!
//! Validation findings (payload errors, response deviations, probe results)
//! are data, not exceptions — they accumulate into lists and never cross the
//! CLI boundary as a `Result::Err`. [`ScimError`] is reserved for everything
//! that genuinely can't produce a result: unreadable input, a transport that
//! never got a response, a malformed config. Every error carries a stable
//! [`ErrorCode`], a message, an optional cause, and arbitrary context.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid or unreadable CLI input (file, stdin, JSON).
    Input,
    /// HTTP transport failures (connect, timeout, TLS, DNS).
    Transport,
    /// Invalid CLI flags or configuration combinations.
    Config,
    /// Reference server startup/lifecycle failures.
    Server,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Transport => "transport",
            Self::Config => "config",
            Self::Server => "server",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Input --
    /// The given path does not exist or could not be opened.
    InputFileNotFound,
    /// Input bytes are not valid JSON.
    InputInvalidJson,
    /// stdin was requested but produced no usable data.
    InputStdinUnreadable,

    // -- Transport --
    /// TCP connection could not be established.
    TransportConnectionRefused,
    /// Request exceeded the configured timeout.
    TransportTimeout,
    /// TLS handshake or certificate validation failed.
    TransportTlsFailure,
    /// DNS resolution failed for the target host.
    TransportDnsFailure,
    /// The configured base URL is not a valid URL.
    TransportInvalidUrl,

    // -- Config --
    /// A CLI flag combination is invalid (e.g. conflicting auth modes).
    ConfigInvalid,
    /// A required credential is missing for the requested operation.
    ConfigMissingCredential,

    // -- Server --
    /// The reference server failed to bind its listening socket.
    ServerBindFailed,
    /// The reference server's shared state lock was poisoned.
    ServerStatePoisoned,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InputFileNotFound | Self::InputInvalidJson | Self::InputStdinUnreadable => {
                ErrorCategory::Input
            }

            Self::TransportConnectionRefused
            | Self::TransportTimeout
            | Self::TransportTlsFailure
            | Self::TransportDnsFailure
            | Self::TransportInvalidUrl => ErrorCategory::Transport,

            Self::ConfigInvalid | Self::ConfigMissingCredential => ErrorCategory::Config,

            Self::ServerBindFailed | Self::ServerStatePoisoned => ErrorCategory::Server,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"TRANSPORT_TIMEOUT"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputFileNotFound => "INPUT_FILE_NOT_FOUND",
            Self::InputInvalidJson => "INPUT_INVALID_JSON",
            Self::InputStdinUnreadable => "INPUT_STDIN_UNREADABLE",
            Self::TransportConnectionRefused => "TRANSPORT_CONNECTION_REFUSED",
            Self::TransportTimeout => "TRANSPORT_TIMEOUT",
            Self::TransportTlsFailure => "TRANSPORT_TLS_FAILURE",
            Self::TransportDnsFailure => "TRANSPORT_DNS_FAILURE",
            Self::TransportInvalidUrl => "TRANSPORT_INVALID_URL",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::ConfigMissingCredential => "CONFIG_MISSING_CREDENTIAL",
            Self::ServerBindFailed => "SERVER_BIND_FAILED",
            Self::ServerStatePoisoned => "SERVER_STATE_POISONED",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScimError
// ---------------------------------------------------------------------------

/// Unified scim-sanity error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use scim_error::{ScimError, ErrorCode};
///
/// let err = ScimError::new(ErrorCode::TransportTimeout, "request timed out")
///     .with_context("endpoint", "/Users")
///     .with_context("timeout_ms", 30_000);
/// ```
pub struct ScimError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl ScimError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Debug for ScimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ScimError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for ScimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ScimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
