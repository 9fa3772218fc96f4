use std::collections::BTreeMap;

/// A case-insensitive header multimap.
///
/// HTTP header names are case-insensitive by spec; SCIM servers are
/// inconsistent about the case they use for `Content-Type`, `ETag`, and
/// `Location`. Lookups here normalise to lowercase while preserving the
/// original case on insertion and iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, (String, String)>,
}

impl Headers {
    /// An empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, overwriting any existing value under the same
    /// case-insensitive name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        self.entries.insert(key, (name, value.into()));
    }

    /// Case-insensitive header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(original-case name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no headers are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Returns a copy of `headers` with any case-insensitive `Authorization`
/// value replaced by `***REDACTED***`. Never mutates the input.
pub fn redact_auth(headers: &Headers) -> Headers {
    let mut redacted = Headers::new();
    for (name, value) in headers.iter() {
        if name.eq_ignore_ascii_case("authorization") {
            redacted.insert(name, "***REDACTED***");
        } else {
            redacted.insert(name, value);
        }
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/scim+json");
        assert_eq!(headers.get("content-type"), Some("application/scim+json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/scim+json"));
    }

    #[test]
    fn redact_auth_does_not_mutate_input() {
        let mut headers = Headers::new();
        headers.insert("Authorization", "Bearer secret-token");
        headers.insert("X-Request-Id", "abc123");

        let redacted = redact_auth(&headers);

        assert_eq!(headers.get("authorization"), Some("Bearer secret-token"));
        assert_eq!(redacted.get("authorization"), Some("***REDACTED***"));
        assert_eq!(redacted.get("x-request-id"), Some("abc123"));
    }

    #[test]
    fn redact_auth_matches_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("authorization", "Basic xyz");
        let redacted = redact_auth(&headers);
        assert_eq!(redacted.get("Authorization"), Some("***REDACTED***"));
    }

    #[test]
    fn redact_auth_is_noop_without_auth_header() {
        let mut headers = Headers::new();
        headers.insert("X-Foo", "bar");
        let redacted = redact_auth(&headers);
        assert_eq!(redacted.get("x-foo"), Some("bar"));
        assert_eq!(redacted.len(), 1);
    }
}
