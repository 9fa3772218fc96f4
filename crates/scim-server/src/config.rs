//! Non-conformance knobs for the reference server (`spec.md` §4.7).
//!
//! Every knob here defaults to "conformant behaviour". Flipping one on
//! makes the server misbehave in one specific, named way so the probe's
//! detection of that exact deviation can be exercised in isolation.

use serde::{Deserialize, Serialize};

/// Reference server configuration: which resource types it exposes, plus
/// the non-conformance knobs `spec.md` §4.7 names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Resource type names exposed in `/ResourceTypes` and routed at all.
    /// A request against an unsupported type's collection gets a 404.
    pub supported_resources: Vec<String>,
    /// Omit `id` from create/read responses.
    pub missing_id: bool,
    /// Omit `meta` entirely from create/read responses.
    pub missing_meta: bool,
    /// Omit only the named `meta` sub-fields (e.g. `"resourceType"`,
    /// `"created"`, `"lastModified"`). Ignored when `missing_meta` is set.
    pub missing_meta_fields: Vec<String>,
    /// Echo a User's `password` attribute back in responses (RFC 7643
    /// §7 names this writeOnly/returned:never; this knob intentionally
    /// violates that for the probe's writeOnly-purge check to catch).
    pub password_in_response: bool,
    /// Number of requests to answer with 429 + `Retry-After: 0` before
    /// resuming normal behaviour. Decrements per request across every
    /// endpoint, not per-resource-type.
    pub throttle_count: u32,
    /// The first GET immediately following a PUT on the same resource
    /// returns the pre-PUT snapshot once, then behaves normally.
    pub stale_after_put: bool,
    /// Respond 400 to any request carrying a `filter=` query parameter.
    pub reject_filters: bool,
    /// Advertise (and emit) `Content-Type: application/json` instead of
    /// `application/scim+json` on every response.
    pub content_type_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            supported_resources: vec![
                "User".to_string(),
                "Group".to_string(),
                "Agent".to_string(),
                "AgenticApplication".to_string(),
            ],
            missing_id: false,
            missing_meta: false,
            missing_meta_fields: Vec::new(),
            password_in_response: false,
            throttle_count: 0,
            stale_after_put: false,
            reject_filters: false,
            content_type_json: false,
        }
    }
}

impl ServerConfig {
    /// A config with every non-conformance knob at its default (off).
    pub fn conformant() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, for manual conformance-testing sessions
    /// (`scim-server --config path.toml`). Fields absent from the file
    /// keep their [`Default`] value via `#[serde(default)]`.
    pub fn from_toml(text: &str) -> Result<Self, scim_error::ScimError> {
        toml::from_str(text).map_err(|e| {
            scim_error::ScimError::new(scim_error::ErrorCode::ConfigInvalid, e.to_string())
        })
    }

    /// `true` if `resource_type` is in `supported_resources`.
    pub fn supports(&self, resource_type: &str) -> bool {
        self.supported_resources.iter().any(|r| r == resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_fully_conformant() {
        let cfg = ServerConfig::default();
        assert!(!cfg.missing_id);
        assert!(!cfg.missing_meta);
        assert!(cfg.missing_meta_fields.is_empty());
        assert!(!cfg.password_in_response);
        assert_eq!(cfg.throttle_count, 0);
        assert!(!cfg.stale_after_put);
        assert!(!cfg.reject_filters);
        assert!(!cfg.content_type_json);
    }

    #[test]
    fn default_supports_all_four_core_resources() {
        let cfg = ServerConfig::default();
        for r in ["User", "Group", "Agent", "AgenticApplication"] {
            assert!(cfg.supports(r), "{r} should be supported by default");
        }
        assert!(!cfg.supports("Widget"));
    }

    #[test]
    fn from_toml_overrides_named_fields_and_keeps_the_rest_default() {
        let cfg = ServerConfig::from_toml("missing_meta = true\nthrottle_count = 2\n").unwrap();
        assert!(cfg.missing_meta);
        assert_eq!(cfg.throttle_count, 2);
        assert!(!cfg.missing_id);
        assert_eq!(cfg.supported_resources.len(), 4);
    }

    #[test]
    fn from_toml_rejects_malformed_input() {
        assert!(ServerConfig::from_toml("not = [valid").is_err());
    }
}
