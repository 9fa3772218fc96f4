//! Produces minimal, spec-compliant SCIM payloads for probe use.
//!
//! Every generated resource carries a shared `scim-sanity-test-` prefix and
//! an 8-hex-character suffix unique to the call, so test resources are
//! trivially identifiable and never collide with real data on a live
//! server. Each function's output, fed through
//! `scim_validate::payload::validate_full`, passes cleanly — that's
//! exercised in this crate's tests via a dev-dependency on `scim-validate`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Shared prefix on every resource this crate generates, so a probe run's
/// test data is trivially identifiable on (and scrubbable from) a live server.
pub const TEST_RESOURCE_PREFIX: &str = "scim-sanity-test-";

fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn merge_extra(mut payload: Value, extra: Option<Value>) -> Value {
    let Some(extra) = extra else {
        return payload;
    };
    if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    payload
}

/// A minimal valid User payload with unique `userName` and email.
///
/// Includes `name`, `displayName`, `active`, and `emails` to exercise
/// common server-side attribute handling during the CRUD lifecycle.
pub fn make_user(extra: Option<Value>) -> Value {
    let suffix = unique_suffix();
    let payload = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "userName": format!("scim-sanity-test-{suffix}@example.com"),
        "name": {
            "givenName": "SCIMSanity",
            "familyName": format!("Test-{suffix}"),
        },
        "displayName": format!("SCIM Sanity Test User {suffix}"),
        "active": true,
        "emails": [
            {
                "value": format!("scim-sanity-test-{suffix}@example.com"),
                "type": "work",
                "primary": true,
            }
        ],
    });
    merge_extra(payload, extra)
}

/// A minimal valid Group payload with unique `displayName`.
pub fn make_group(members: Option<Vec<Value>>, extra: Option<Value>) -> Value {
    let suffix = unique_suffix();
    let mut payload = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
        "displayName": format!("scim-sanity-test-group-{suffix}"),
    });
    if let Some(members) = members {
        if !members.is_empty() {
            payload["members"] = Value::Array(members);
        }
    }
    merge_extra(payload, extra)
}

/// A minimal valid Agent payload per draft-abbey-scim-agent-extension-00.
///
/// Includes `displayName` and `active` beyond the required `name` to
/// exercise common attribute handling.
pub fn make_agent(extra: Option<Value>) -> Value {
    let suffix = unique_suffix();
    let payload = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Agent"],
        "name": format!("scim-sanity-test-agent-{suffix}"),
        "displayName": format!("SCIM Sanity Test Agent {suffix}"),
        "active": true,
    });
    merge_extra(payload, extra)
}

/// A minimal valid AgenticApplication payload.
pub fn make_agentic_application(extra: Option<Value>) -> Value {
    let suffix = unique_suffix();
    let payload = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:AgenticApplication"],
        "name": format!("scim-sanity-test-app-{suffix}"),
        "displayName": format!("SCIM Sanity Test App {suffix}"),
        "active": true,
    });
    merge_extra(payload, extra)
}

/// Wrap `operations` in a SCIM PatchOp envelope.
pub fn make_patch(operations: Vec<Value>) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "Operations": operations,
    })
}

/// A shallow copy of `original` with `displayName` changed to `new_name`.
///
/// `original` is never mutated; the caller's value is untouched.
pub fn update_user_display_name(original: &Value, new_name: &str) -> Value {
    let mut updated = original
        .as_object()
        .cloned()
        .unwrap_or_else(Map::new);
    updated.insert("displayName".to_string(), Value::String(new_name.to_string()));
    Value::Object(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scim_validate::payload::validate_full;

    #[test]
    fn make_user_passes_validation() {
        let user = make_user(None);
        let (ok, errors) = validate_full(&user);
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn make_group_passes_validation() {
        let group = make_group(None, None);
        let (ok, errors) = validate_full(&group);
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn make_group_with_members_passes_validation() {
        let group = make_group(
            Some(vec![json!({"value": "user-1", "type": "User"})]),
            None,
        );
        let (ok, errors) = validate_full(&group);
        assert!(ok, "{errors:?}");
        assert_eq!(group["members"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn make_agent_passes_validation() {
        let agent = make_agent(None);
        let (ok, errors) = validate_full(&agent);
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn make_agentic_application_passes_validation() {
        let app = make_agentic_application(None);
        let (ok, errors) = validate_full(&app);
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn factory_outputs_are_unique_per_call() {
        let first = make_user(None);
        let second = make_user(None);
        assert_ne!(first["userName"], second["userName"]);
    }

    #[test]
    fn extra_fields_override_defaults() {
        let user = make_user(Some(json!({"active": false})));
        assert_eq!(user["active"], false);
    }

    #[test]
    fn update_user_display_name_does_not_mutate_original() {
        let original = make_user(None);
        let original_name = original["displayName"].clone();
        let updated = update_user_display_name(&original, "Updated-abc123");

        assert_eq!(original["displayName"], original_name);
        assert_eq!(updated["displayName"], "Updated-abc123");
    }

    #[test]
    fn update_user_display_name_is_idempotent() {
        let original = make_user(None);
        let once = update_user_display_name(&original, "Same-Name");
        let twice = update_user_display_name(&once, "Same-Name");
        assert_eq!(once, twice);
    }

    #[test]
    fn make_patch_wraps_operations() {
        let patch = make_patch(vec![json!({"op": "replace", "path": "active", "value": false})]);
        let (ok, errors) = scim_validate::payload::validate_patch(&patch);
        assert!(ok, "{errors:?}");
    }
}
