//! Server-side required-attribute enforcement (`spec.md` §4.7 / `SPEC_FULL.md`
//! §3): this is what Phase 7 of the probe (`spec.md` §4.6) actually probes
//! against, so the reference server must reject the same malformed POSTs a
//! real server is expected to.

use serde_json::Value;

/// Check `body` against the minimum a POST of `resource_type` must carry.
/// Returns `Some(detail)` describing the first violation found, or `None`
/// if the document is acceptable.
pub fn missing_required_attribute(resource_type: &str, body: &Value) -> Option<String> {
    let schemas = body.get("schemas").and_then(Value::as_array);
    match schemas {
        None => return Some("'schemas' is required and must be a non-empty array".to_string()),
        Some(list) if list.is_empty() => {
            return Some("'schemas' is required and must be a non-empty array".to_string())
        }
        Some(_) => {}
    }

    match resource_type {
        "User" => {
            if body.get("userName").and_then(Value::as_str).is_none_or(str::is_empty) {
                return Some("'userName' is required for User".to_string());
            }
        }
        "Group" => {
            if body
                .get("displayName")
                .and_then(Value::as_str)
                .is_none_or(str::is_empty)
            {
                return Some("'displayName' is required for Group".to_string());
            }
        }
        "Agent" | "AgenticApplication" => {
            if body.get("name").and_then(Value::as_str).is_none_or(str::is_empty) {
                return Some(format!("'name' is required and must be non-empty for {resource_type}"));
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_schemas_is_rejected() {
        let err = missing_required_attribute("User", &json!({}));
        assert!(err.unwrap().contains("schemas"));
    }

    #[test]
    fn user_without_username_is_rejected() {
        let body = json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"]});
        assert!(missing_required_attribute("User", &body).unwrap().contains("userName"));
    }

    #[test]
    fn group_without_display_name_is_rejected() {
        let body = json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"]});
        assert!(missing_required_attribute("Group", &body)
            .unwrap()
            .contains("displayName"));
    }

    #[test]
    fn agent_with_empty_name_is_rejected() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Agent"],
            "name": "",
        });
        assert!(missing_required_attribute("Agent", &body).unwrap().contains("non-empty"));
    }

    #[test]
    fn conformant_user_passes() {
        let body = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "alice",
        });
        assert!(missing_required_attribute("User", &body).is_none());
    }
}
