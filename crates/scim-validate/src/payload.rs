//! Validates documents a client is about to send to a SCIM server.

use std::fmt;

use scim_schema::{self as schema, Attribute, Mutability};
use serde_json::Value;

/// A single problem found while validating an outbound payload.
///
/// `path` is a dotted attribute path (possibly empty, for document-level
/// problems); `line` is populated only when the caller has a source line
/// map to offer (plain `serde_json::Value` input never does).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Dotted attribute path, empty for document-level errors.
    pub path: String,
    /// Source line number, when known.
    pub line: Option<usize>,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: String::new(),
            line: None,
        }
    }

    fn at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            line: None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.path.is_empty() {
            write!(f, " at {}", self.path)?;
        }
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

/// Validate a full SCIM resource document intended for POST/PUT.
///
/// Accumulates every problem found during a single top-down traversal
/// rather than stopping at the first; callers get the whole picture. Fails
/// fast only when `schemas` itself is unusable, since nothing downstream
/// can be checked without it.
pub fn validate_full(doc: &Value) -> (bool, Vec<ValidationError>) {
    let mut errors = Vec::new();

    let Some(obj) = doc.as_object() else {
        errors.push(ValidationError::new("Document must be a JSON object"));
        return (false, errors);
    };

    let Some(schemas) = obj.get("schemas") else {
        errors.push(ValidationError::new("Missing required field: 'schemas'"));
        return (false, errors);
    };

    let Some(schema_list) = schemas.as_array() else {
        errors.push(ValidationError::new("'schemas' must be a non-empty array"));
        return (false, errors);
    };
    let schema_urns: Vec<&str> = schema_list.iter().filter_map(Value::as_str).collect();
    if schema_urns.is_empty() {
        errors.push(ValidationError::new("'schemas' must be a non-empty array"));
        return (false, errors);
    }

    let is_user = schema_urns.contains(&schema::USER);
    let is_group = schema_urns.contains(&schema::GROUP);
    let is_agent = schema_urns.contains(&schema::AGENT);
    let is_agentic_application = schema_urns.contains(&schema::AGENTIC_APPLICATION);

    if !is_user && !is_group && !is_agent && !is_agentic_application {
        errors.push(ValidationError::new(format!(
            "Invalid schema URN. Must include '{}', '{}', '{}', or '{}'",
            schema::USER,
            schema::GROUP,
            schema::AGENT,
            schema::AGENTIC_APPLICATION,
        )));
        return (false, errors);
    }

    for &urn in &schema_urns {
        match schema::get_schema(urn) {
            Some(resolved) => validate_schema_attributes(obj, urn, resolved, &mut errors),
            None => errors.push(ValidationError::new(format!("Unknown schema URN: {urn}"))),
        }
    }

    if is_user {
        validate_user_specific(obj, &mut errors);
    } else if is_group {
        validate_group_specific(obj, &mut errors);
    } else if is_agent {
        validate_agent_specific(obj, "Agent", &mut errors);
    } else if is_agentic_application {
        validate_agent_specific(obj, "AgenticApplication", &mut errors);
    }

    check_immutable_attributes(obj, &schema_urns, &mut errors);
    check_null_semantics(obj, &mut errors);

    (errors.is_empty(), errors)
}

fn validate_schema_attributes(
    doc: &serde_json::Map<String, Value>,
    schema_urn: &str,
    schema: &schema::Schema,
    errors: &mut Vec<ValidationError>,
) {
    let is_extension = schema_urn.starts_with("urn:ietf:params:scim:schemas:extension:");
    let extension_data = if is_extension {
        match doc.get(schema_urn).and_then(Value::as_object) {
            Some(map) => map,
            None => {
                if doc.contains_key(schema_urn) {
                    errors.push(ValidationError::at(
                        format!("Extension schema '{schema_urn}' must be an object"),
                        schema_urn,
                    ));
                }
                return;
            }
        }
    } else {
        doc
    };

    for attr in &schema.attributes {
        let meta = attr.meta();
        let full_path = |name: &str| -> String {
            if is_extension {
                format!("{schema_urn}.{name}")
            } else {
                name.to_string()
            }
        };

        if meta.required && !extension_data.contains_key(&meta.name) {
            errors.push(ValidationError::at(
                format!(
                    "Missing required attribute: '{}' (schema: {schema_urn})",
                    meta.name
                ),
                full_path(&meta.name),
            ));
        }

        if let (true, Some(value)) = (attr.is_complex(), extension_data.get(&meta.name)) {
            let path = full_path(&meta.name);
            if meta.multi_valued {
                match value.as_array() {
                    Some(items) => {
                        for (idx, item) in items.iter().enumerate() {
                            validate_complex_attribute(item, attr, &format!("{path}[{idx}]"), errors);
                        }
                    }
                    None => errors.push(ValidationError::at(
                        format!("Attribute '{}' must be an array (multiValued)", meta.name),
                        path,
                    )),
                }
            } else {
                validate_complex_attribute(value, attr, &path, errors);
            }
        }
    }
}

fn validate_complex_attribute(
    value: &Value,
    attr: &Attribute,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let Some(obj) = value.as_object() else {
        return;
    };
    let Some(sub_attrs) = attr.sub_attributes() else {
        return;
    };
    for sub in sub_attrs {
        let sub_meta = sub.meta();
        if sub_meta.required && !obj.contains_key(&sub_meta.name) {
            errors.push(ValidationError::at(
                format!("Missing required sub-attribute: '{}' in '{path}'", sub_meta.name),
                format!("{path}.{}", sub_meta.name),
            ));
        }
    }
}

fn validate_user_specific(doc: &serde_json::Map<String, Value>, errors: &mut Vec<ValidationError>) {
    if !doc.contains_key("userName") {
        errors.push(ValidationError::new(
            "User resource missing required attribute: 'userName'",
        ));
    }
}

fn validate_group_specific(doc: &serde_json::Map<String, Value>, errors: &mut Vec<ValidationError>) {
    if !doc.contains_key("displayName") {
        errors.push(ValidationError::new(
            "Group resource missing required attribute: 'displayName'",
        ));
    }
}

/// Agent and AgenticApplication both require a non-empty `name`
/// (draft-abbey-scim-agent-extension-00 §5.1.4/§5.2.4).
fn validate_agent_specific(
    doc: &serde_json::Map<String, Value>,
    resource_name: &str,
    errors: &mut Vec<ValidationError>,
) {
    match doc.get("name") {
        None => errors.push(ValidationError::new(format!(
            "{resource_name} resource missing required attribute: 'name'"
        ))),
        Some(Value::String(s)) if s.is_empty() => errors.push(ValidationError::new(format!(
            "{resource_name} resource 'name' attribute must be non-empty"
        ))),
        Some(_) => {}
    }
}

fn check_immutable_attributes(
    doc: &serde_json::Map<String, Value>,
    schema_urns: &[&str],
    errors: &mut Vec<ValidationError>,
) {
    for &schema_urn in schema_urns {
        let Some(resolved) = schema::get_schema(schema_urn) else {
            continue;
        };
        let is_extension = schema_urn.starts_with("urn:ietf:params:scim:schemas:extension:");
        let check_data = if is_extension {
            match doc.get(schema_urn).and_then(Value::as_object) {
                Some(map) => map,
                None => continue,
            }
        } else {
            doc
        };

        for attr in &resolved.attributes {
            let meta = attr.meta();
            if meta.mutability == Mutability::ReadOnly && check_data.contains_key(&meta.name) {
                let full_path = if is_extension {
                    format!("{schema_urn}.{}", meta.name)
                } else {
                    meta.name.clone()
                };
                errors.push(ValidationError::at(
                    format!(
                        "Immutable attribute '{}' should not be set by client (mutability: readOnly)",
                        meta.name
                    ),
                    full_path,
                ));
            }
        }
    }
}

fn check_null_semantics(doc: &serde_json::Map<String, Value>, errors: &mut Vec<ValidationError>) {
    for (key, value) in doc {
        if value.is_null() {
            errors.push(ValidationError::at(
                format!(
                    "Attribute '{key}' has null value. Use PATCH 'remove' operation to clear attributes instead"
                ),
                key.clone(),
            ));
        }
    }
}

/// Validate a SCIM PatchOp document.
pub fn validate_patch(doc: &Value) -> (bool, Vec<ValidationError>) {
    let mut errors = Vec::new();

    let Some(obj) = doc.as_object() else {
        errors.push(ValidationError::new("Document must be a JSON object"));
        return (false, errors);
    };

    let Some(schemas) = obj.get("schemas") else {
        errors.push(ValidationError::new("Missing required field: 'schemas'"));
        return (false, errors);
    };

    let has_patch_schema = schemas
        .as_array()
        .map(|list| list.iter().any(|v| v.as_str() == Some(schema::PATCH_OP)))
        .unwrap_or(false);
    if !has_patch_schema {
        errors.push(ValidationError::new(format!(
            "PATCH operation must include schema: '{}'",
            schema::PATCH_OP
        )));
    }

    let Some(operations) = obj.get("Operations") else {
        errors.push(ValidationError::new("Missing required field: 'Operations'"));
        return (false, errors);
    };

    let Some(operations) = operations.as_array() else {
        errors.push(ValidationError::new("'Operations' must be an array"));
        return (false, errors);
    };

    if operations.is_empty() {
        errors.push(ValidationError::new("'Operations' array cannot be empty"));
        return (false, errors);
    }

    let mut seen_paths = std::collections::HashSet::new();
    for (idx, op) in operations.iter().enumerate() {
        let Some(op_obj) = op.as_object() else {
            errors.push(ValidationError::new(format!("Operation {idx} must be an object")));
            continue;
        };

        let op_type = op_obj.get("op").and_then(Value::as_str);
        let Some(op_type) = op_type else {
            errors.push(ValidationError::new(format!(
                "Operation {idx}: missing required field 'op'"
            )));
            continue;
        };

        if !["add", "remove", "replace"].contains(&op_type) {
            errors.push(ValidationError::new(format!(
                "Operation {idx}: invalid 'op' value '{op_type}'. Must be one of: add, remove, replace"
            )));
        }

        if let Some(path) = op_obj.get("path").and_then(Value::as_str) {
            if !seen_paths.insert(path) {
                errors.push(ValidationError::new(format!(
                    "Operation {idx}: duplicate path '{path}' in PATCH operations"
                )));
            }
        }

        match op_type {
            "remove" if !op_obj.contains_key("path") => errors.push(ValidationError::new(format!(
                "Operation {idx}: 'remove' operation requires 'path'"
            ))),
            "add" | "replace" if !op_obj.contains_key("value") => {
                errors.push(ValidationError::new(format!(
                    "Operation {idx}: '{op_type}' operation requires 'value'"
                )))
            }
            _ => {}
        }
    }

    (errors.is_empty(), errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_user_passes() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "john.doe@example.com",
        });
        let (ok, errors) = validate_full(&doc);
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn agent_requires_name() {
        let doc = json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:Agent"]});
        let (ok, errors) = validate_full(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("name") && e.message.contains("required")));
    }

    #[test]
    fn agent_empty_name_is_rejected() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Agent"],
            "name": "",
        });
        let (ok, errors) = validate_full(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("non-empty")));
    }

    #[test]
    fn missing_schemas_fails_fast() {
        let doc = json!({"userName": "x"});
        let (ok, errors) = validate_full(&doc);
        assert!(!ok);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn group_requires_display_name() {
        let doc = json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"]});
        let (ok, errors) = validate_full(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("displayName")));
    }

    #[test]
    fn id_and_meta_set_by_client_are_immutable_violations() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "john.doe@example.com",
            "id": "client-supplied",
        });
        let (ok, errors) = validate_full(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("Immutable")));
    }

    #[test]
    fn null_value_is_rejected() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "john.doe@example.com",
            "nickName": null,
        });
        let (ok, errors) = validate_full(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("null value")));
    }

    #[test]
    fn unknown_schema_urn_reports_and_continues() {
        let doc = json!({
            "schemas": [
                "urn:ietf:params:scim:schemas:core:2.0:User",
                "urn:ietf:params:scim:schemas:core:2.0:Widget",
            ],
            "userName": "john.doe@example.com",
        });
        let (ok, errors) = validate_full(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("Unknown schema URN")));
    }

    #[test]
    fn patch_requires_patchop_schema() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "Operations": [{"op": "replace", "path": "active", "value": false}],
        });
        let (ok, errors) = validate_patch(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("PatchOp")));
    }

    #[test]
    fn patch_empty_operations_is_invalid() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
            "Operations": [],
        });
        let (ok, errors) = validate_patch(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("cannot be empty")));
    }

    #[test]
    fn patch_duplicate_path_rejected() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
            "Operations": [
                {"op": "replace", "path": "displayName", "value": "A"},
                {"op": "replace", "path": "displayName", "value": "B"},
            ],
        });
        let (ok, errors) = validate_patch(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }

    #[test]
    fn patch_remove_requires_path() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
            "Operations": [{"op": "remove"}],
        });
        let (ok, errors) = validate_patch(&doc);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.message.contains("requires 'path'")));
    }

    #[test]
    fn revalidating_a_clone_yields_identical_errors() {
        let doc = json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:Agent"]});
        let (_, first) = validate_full(&doc);
        let (_, second) = validate_full(&doc.clone());
        assert_eq!(first, second);
    }
}
