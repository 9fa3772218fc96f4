//! Validates what a server sends back — the inverse of [`crate::payload`].
//!
//! Responses MUST include `id` and `meta`, MUST NOT echo writeOnly
//! attributes, and must use correct status codes, `Content-Type`, and ETag
//! consistency. [`ResponseValidator`] is parameterised by `strict`: a
//! handful of deviations real servers commonly make (`application/json`
//! instead of `application/scim+json`, a missing error schema URN, ...) are
//! reported as [`Severity::Warn`] in compat mode and [`Severity::Fail`] in
//! strict mode; everything else is always a hard failure.

use std::fmt;

use scim_schema::{self as schema, Mutability, Returned};
use serde_json::Value;

/// FAIL or WARN severity for a single response-validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A spec violation. Always drives `ok` to `false`.
    Fail,
    /// A known real-world deviation, tolerated in compat mode.
    Warn,
}

/// A single validation finding from checking a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerValidationError {
    /// Human-readable description of the issue.
    pub message: String,
    /// Dot-notation path to the problematic field, e.g. `meta.resourceType`.
    pub path: String,
    /// FAIL for spec violations, WARN for tolerated deviations.
    pub severity: Severity,
}

impl ServerValidationError {
    fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            path: String::new(),
            severity,
        }
    }

    fn at(message: impl Into<String>, path: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            severity,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Fail)
    }

    fn fail_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::at(message, path, Severity::Fail)
    }
}

impl fmt::Display for ServerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.severity == Severity::Warn {
            write!(f, "[WARN] ")?;
        }
        write!(f, "{}", self.message)?;
        if !self.path.is_empty() {
            write!(f, " at {}", self.path)?;
        }
        Ok(())
    }
}

/// A case-insensitive snapshot of response headers, as handed in by the
/// transport layer. Plain `&str`/`&str` pairs are enough here; callers
/// typically pass `scim_transport::Headers::iter()` collected into this.
pub type HeaderView<'a> = std::collections::BTreeMap<&'a str, &'a str>;

fn header_value<'a>(headers: &'a HeaderView<'a>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| *v)
}

/// Strips at most one layer of surrounding `"` and a leading weak-ETag
/// `W/` marker, per `spec.md` §6 open-question resolution 3 (no full
/// RFC 7232 strong/weak semantics).
fn normalize_etag(value: &str) -> &str {
    value.strip_prefix("W/").unwrap_or(value).trim_matches('"')
}

/// Validates server responses for RFC 7643/7644 conformance.
///
/// In compat mode (`strict: false`), only FAIL-severity findings drive
/// `ok` to `false`; WARN findings are informational.
pub struct ResponseValidator {
    strict: bool,
}

impl ResponseValidator {
    /// A validator in strict mode (every deviation is a FAIL).
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// A validator in compat mode (known deviations downgrade to WARN).
    pub fn compat() -> Self {
        Self { strict: false }
    }

    /// Construct with an explicit strictness flag.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    fn severity(&self, strict_only: bool) -> Severity {
        if strict_only && !self.strict {
            Severity::Warn
        } else {
            Severity::Fail
        }
    }

    fn is_valid(errors: &[ServerValidationError]) -> bool {
        !errors.iter().any(|e| e.severity == Severity::Fail)
    }

    /// Validate a response containing a single SCIM resource.
    pub fn validate_resource(
        &self,
        body: Option<&Value>,
        expected_status: u16,
        actual_status: u16,
        headers: &HeaderView<'_>,
        resource_type: Option<&str>,
    ) -> (bool, Vec<ServerValidationError>) {
        let mut errors = Vec::new();

        if actual_status != expected_status {
            errors.push(ServerValidationError::fail(format!(
                "Expected HTTP {expected_status}, got {actual_status}"
            )));
            if actual_status >= 400 {
                return (Self::is_valid(&errors), errors);
            }
        }

        let Some(body) = body else {
            if expected_status != 204 {
                errors.push(ServerValidationError::fail("Response body is empty"));
            }
            return (Self::is_valid(&errors), errors);
        };

        if let Some(ct) = header_value(headers, "Content-Type") {
            if ct.contains("application/scim+json") {
                // correct per spec
            } else if ct.contains("application/json") {
                errors.push(ServerValidationError::new(
                    format!("Content-Type should be application/scim+json, got '{ct}'"),
                    self.severity(true),
                ));
            } else {
                errors.push(ServerValidationError::fail(format!(
                    "Content-Type should be application/scim+json, got '{ct}'"
                )));
            }
        }

        let schemas = body.get("schemas").and_then(Value::as_array);
        if schemas.is_none_or(|s| s.is_empty()) {
            errors.push(ServerValidationError::fail("Response missing 'schemas' array"));
            return (false, errors);
        }

        if body.get("id").is_none() {
            errors.push(ServerValidationError::fail(
                "Server response missing required attribute 'id'",
            ));
        }

        let meta = body.get("meta");
        match meta {
            None | Some(Value::Null) => errors.push(ServerValidationError::fail(
                "Server response missing required attribute 'meta'",
            )),
            Some(meta_value) => {
                if let Some(meta_obj) = meta_value.as_object() {
                    for field in ["resourceType", "created", "lastModified"] {
                        if !meta_obj.contains_key(field) {
                            errors.push(ServerValidationError::fail_at(
                                format!("meta.{field} must be present in server response"),
                                format!("meta.{field}"),
                            ));
                        }
                    }
                    if let Some(version) = meta_obj.get("version") {
                        if !version.is_string() {
                            errors.push(ServerValidationError::fail_at(
                                format!(
                                    "meta.version must be a string, got {}",
                                    json_type_name(version)
                                ),
                                "meta.version",
                            ));
                        }
                    }
                }
            }
        }

        if let (Some(etag), Some(meta_obj)) = (
            header_value(headers, "ETag"),
            meta.and_then(Value::as_object),
        ) {
            if let Some(version) = meta_obj.get("version").and_then(Value::as_str) {
                if normalize_etag(etag) != normalize_etag(version) {
                    errors.push(ServerValidationError::new(
                        format!("ETag header '{etag}' does not match meta.version '{version}'"),
                        self.severity(true),
                    ));
                }
            }
        }

        if actual_status == 201 {
            if let Some(meta_obj) = meta.and_then(Value::as_object) {
                let loc_header = header_value(headers, "Location");
                let meta_loc = meta_obj.get("location").and_then(Value::as_str);
                match (loc_header, meta_loc) {
                    (Some(loc_header), Some(meta_loc)) if loc_header != meta_loc => {
                        errors.push(ServerValidationError::new(
                            format!(
                                "Location header '{loc_header}' does not match meta.location '{meta_loc}'"
                            ),
                            self.severity(true),
                        ));
                    }
                    (None, _) => errors.push(ServerValidationError::new(
                        "Location header should be present on 201 Created",
                        self.severity(true),
                    )),
                    _ => {}
                }
            }
        }

        self.check_write_only(body, schemas.unwrap(), &mut errors);

        if let Some(expected_type) = resource_type {
            self.check_resource_type_match(body, expected_type, &mut errors);
        }

        (Self::is_valid(&errors), errors)
    }

    /// Validate a ListResponse (RFC 7644 §3.4.2).
    pub fn validate_list(
        &self,
        body: Option<&Value>,
        actual_status: u16,
    ) -> (bool, Vec<ServerValidationError>) {
        let mut errors = Vec::new();

        if actual_status != 200 {
            errors.push(ServerValidationError::fail(format!(
                "Expected HTTP 200 for list, got {actual_status}"
            )));
        }

        let Some(body) = body else {
            errors.push(ServerValidationError::fail("Response body is empty"));
            return (false, errors);
        };

        let schemas = body
            .get("schemas")
            .and_then(Value::as_array)
            .map(|list| list.iter().any(|v| v.as_str() == Some(schema::LIST_RESPONSE)))
            .unwrap_or(false);
        if !schemas {
            errors.push(ServerValidationError::fail(format!(
                "ListResponse must include schema '{}'",
                schema::LIST_RESPONSE
            )));
        }

        match body.get("totalResults") {
            None => errors.push(ServerValidationError::fail(
                "ListResponse missing required attribute 'totalResults'",
            )),
            Some(v) if !v.is_i64() && !v.is_u64() => errors.push(ServerValidationError::new(
                format!("totalResults must be an integer, got {}", json_type_name(v)),
                self.severity(true),
            )),
            _ => {}
        }

        if let Some(resources) = body.get("Resources") {
            if !resources.is_array() {
                errors.push(ServerValidationError::fail("'Resources' must be an array"));
            }
        }

        for field in ["startIndex", "itemsPerPage"] {
            if let Some(v) = body.get(field) {
                if !v.is_i64() && !v.is_u64() {
                    errors.push(ServerValidationError::new(
                        format!("'{field}' must be an integer"),
                        self.severity(true),
                    ));
                }
            }
        }

        (Self::is_valid(&errors), errors)
    }

    /// Validate a SCIM error response (RFC 7644 §3.12).
    pub fn validate_error(
        &self,
        body: Option<&Value>,
        expected_status: u16,
        actual_status: u16,
    ) -> (bool, Vec<ServerValidationError>) {
        let mut errors = Vec::new();

        if actual_status != expected_status {
            errors.push(ServerValidationError::fail(format!(
                "Expected HTTP {expected_status}, got {actual_status}"
            )));
        }

        let Some(body) = body else {
            errors.push(ServerValidationError::new(
                "Error response body is empty",
                self.severity(true),
            ));
            return (Self::is_valid(&errors), errors);
        };

        let has_error_schema = body
            .get("schemas")
            .and_then(Value::as_array)
            .map(|list| list.iter().any(|v| v.as_str() == Some(schema::ERROR)))
            .unwrap_or(false);
        if !has_error_schema {
            errors.push(ServerValidationError::new(
                format!("Error response must include schema '{}'", schema::ERROR),
                self.severity(true),
            ));
        }

        if body.get("status").is_none() {
            errors.push(ServerValidationError::new(
                "Error response missing required attribute 'status'",
                self.severity(true),
            ));
        }

        (Self::is_valid(&errors), errors)
    }

    /// Validate a DELETE response (RFC 7644 §3.6 — expect 204 No Content).
    pub fn validate_delete(
        &self,
        actual_status: u16,
        body: &str,
    ) -> (bool, Vec<ServerValidationError>) {
        let mut errors = Vec::new();
        if actual_status != 204 {
            errors.push(ServerValidationError::fail(format!(
                "Expected HTTP 204 for DELETE, got {actual_status}"
            )));
        }
        if !body.trim().is_empty() {
            errors.push(ServerValidationError::new(
                "DELETE 204 response should have no body",
                self.severity(true),
            ));
        }
        (Self::is_valid(&errors), errors)
    }

    fn check_write_only(
        &self,
        body: &Value,
        schemas: &[Value],
        errors: &mut Vec<ServerValidationError>,
    ) {
        for schema_urn in schemas.iter().filter_map(Value::as_str) {
            let Some(resolved) = schema::get_schema(schema_urn) else {
                continue;
            };
            let is_extension = schema_urn.starts_with("urn:ietf:params:scim:schemas:extension:");
            let check_data = if is_extension {
                match body.get(schema_urn).and_then(Value::as_object) {
                    Some(map) => map,
                    None => continue,
                }
            } else {
                match body.as_object() {
                    Some(map) => map,
                    None => continue,
                }
            };
            for attr in &resolved.attributes {
                let meta = attr.meta();
                let never_returned =
                    meta.returned == Returned::Never || meta.mutability == Mutability::WriteOnly;
                if never_returned && check_data.contains_key(&meta.name) {
                    errors.push(ServerValidationError::fail_at(
                        format!(
                            "writeOnly attribute '{}' must not appear in server response",
                            meta.name
                        ),
                        meta.name.clone(),
                    ));
                }
            }
        }
    }

    fn check_resource_type_match(
        &self,
        body: &Value,
        expected_type: &str,
        errors: &mut Vec<ServerValidationError>,
    ) {
        if let Some(rt) = body
            .get("meta")
            .and_then(Value::as_object)
            .and_then(|meta| meta.get("resourceType"))
            .and_then(Value::as_str)
        {
            if rt != expected_type {
                errors.push(ServerValidationError::fail_at(
                    format!("meta.resourceType '{rt}' does not match expected '{expected_type}'"),
                    "meta.resourceType",
                ));
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers<'a>(pairs: &[(&'a str, &'a str)]) -> HeaderView<'a> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn conformant_resource_passes_strict_and_compat() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "abc123",
            "userName": "john.doe@example.com",
            "meta": {
                "resourceType": "User",
                "created": "2024-01-01T00:00:00Z",
                "lastModified": "2024-01-01T00:00:00Z",
            },
        });
        let h = headers(&[("Content-Type", "application/scim+json")]);
        for validator in [ResponseValidator::strict(), ResponseValidator::compat()] {
            let (ok, errors) = validator.validate_resource(Some(&body), 200, 200, &h, Some("User"));
            assert!(ok, "{errors:?}");
        }
    }

    #[test]
    fn missing_meta_is_a_fail() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "abc123",
        });
        let h = headers(&[]);
        let (ok, errors) = ResponseValidator::strict().validate_resource(Some(&body), 200, 200, &h, None);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("meta")));
    }

    #[test]
    fn password_echoed_back_is_always_fail() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "abc123",
            "password": "hunter2",
            "meta": {"resourceType": "User", "created": "t", "lastModified": "t"},
        });
        let h = headers(&[]);
        for validator in [ResponseValidator::strict(), ResponseValidator::compat()] {
            let (ok, errors) = validator.validate_resource(Some(&body), 200, 200, &h, None);
            assert!(!ok);
            assert!(errors.iter().any(|e| e.message.contains("writeOnly")));
        }
    }

    #[test]
    fn content_type_json_is_warn_in_compat_fail_in_strict() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "abc123",
            "meta": {"resourceType": "User", "created": "t", "lastModified": "t"},
        });
        let h = headers(&[("Content-Type", "application/json")]);

        let (ok_strict, errors_strict) =
            ResponseValidator::strict().validate_resource(Some(&body), 200, 200, &h, None);
        assert!(!ok_strict);
        assert!(errors_strict.iter().any(|e| e.severity == Severity::Fail));

        let (ok_compat, errors_compat) =
            ResponseValidator::compat().validate_resource(Some(&body), 200, 200, &h, None);
        assert!(ok_compat);
        assert!(errors_compat.iter().any(|e| e.severity == Severity::Warn));
    }

    #[test]
    fn error_status_short_circuits_field_checks() {
        let h = headers(&[]);
        let (ok, errors) = ResponseValidator::strict().validate_resource(None, 200, 404, &h, None);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn list_response_requires_schema_and_integer_total() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
            "totalResults": 0,
            "Resources": [],
        });
        let (ok, errors) = ResponseValidator::strict().validate_list(Some(&body), 200);
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn list_response_count_zero_has_empty_resources() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
            "totalResults": 0,
            "Resources": [],
            "startIndex": 1,
            "itemsPerPage": 0,
        });
        let (ok, _) = ResponseValidator::strict().validate_list(Some(&body), 200);
        assert!(ok);
        assert_eq!(body["Resources"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn error_response_missing_schema_is_strict_only() {
        let body = json!({"status": "404"});
        let (ok_strict, _) = ResponseValidator::strict().validate_error(Some(&body), 404, 404);
        assert!(!ok_strict);
        let (ok_compat, _) = ResponseValidator::compat().validate_error(Some(&body), 404, 404);
        assert!(ok_compat);
    }

    #[test]
    fn delete_expects_204_empty_body() {
        let (ok, _) = ResponseValidator::strict().validate_delete(204, "");
        assert!(ok);
        let (ok_wrong_status, _) = ResponseValidator::strict().validate_delete(200, "");
        assert!(!ok_wrong_status);
    }

    #[test]
    fn delete_204_with_body_is_strict_only() {
        let (ok_strict, _) = ResponseValidator::strict().validate_delete(204, "{}");
        assert!(!ok_strict);
        let (ok_compat, _) = ResponseValidator::compat().validate_delete(204, "{}");
        assert!(ok_compat);
    }

    #[test]
    fn etag_mismatch_is_strict_only() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "abc123",
            "meta": {"resourceType": "User", "created": "t", "lastModified": "t", "version": "W/\"aaa\""},
        });
        let h = headers(&[("ETag", "W/\"bbb\"")]);
        let (ok_strict, _) = ResponseValidator::strict().validate_resource(Some(&body), 200, 200, &h, None);
        assert!(!ok_strict);
        let (ok_compat, _) = ResponseValidator::compat().validate_resource(Some(&body), 200, 200, &h, None);
        assert!(ok_compat);
    }

    #[test]
    fn resource_type_mismatch_is_always_fail() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "abc123",
            "meta": {"resourceType": "Group", "created": "t", "lastModified": "t"},
        });
        let h = headers(&[]);
        let (ok, errors) = ResponseValidator::compat().validate_resource(Some(&body), 200, 200, &h, Some("User"));
        assert!(!ok);
        assert!(errors.iter().any(|e| e.path == "meta.resourceType"));
    }
}
