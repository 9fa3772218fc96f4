use crate::headers::Headers;
use std::sync::OnceLock;

/// The uniform response envelope every transport call returns.
///
/// `body` is parsed lazily and cached: most callers only need the JSON view
/// once, and some responses (DELETE 204) have no body at all.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    body_text: Option<String>,
    parsed: OnceLock<Option<serde_json::Value>>,
}

impl HttpResponse {
    /// Construct a response from its parts.
    pub fn new(status: u16, headers: Headers, body_text: Option<String>) -> Self {
        Self {
            status,
            headers,
            body_text,
            parsed: OnceLock::new(),
        }
    }

    /// Raw response body text, if any was returned.
    pub fn body_text(&self) -> Option<&str> {
        self.body_text.as_deref()
    }

    /// Lazily parsed JSON view of the body.
    ///
    /// Returns `None` when the body is absent or is not valid JSON; callers
    /// that need to distinguish "empty" from "malformed" should inspect
    /// [`HttpResponse::body_text`] directly.
    pub fn json(&self) -> Option<&serde_json::Value> {
        self.parsed
            .get_or_init(|| {
                self.body_text
                    .as_ref()
                    .filter(|s| !s.trim().is_empty())
                    .and_then(|s| serde_json::from_str(s).ok())
            })
            .as_ref()
    }

    /// Case-insensitive header lookup, shorthand for `self.headers.get`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
