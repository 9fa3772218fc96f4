//! Axum handlers for the reference server.
//!
//! Every handler takes the single coarse lock once (`spec.md` §5), does
//! all of its work synchronously while holding it, and releases it before
//! returning. Response shaping (which `meta` fields to omit, whether to
//! echo `password`, which `Content-Type` to advertise) is centralised in
//! [`render_resource`] so every handler that returns a resource body goes
//! through the same non-conformance knobs.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::discovery;
use crate::state::{
    build_meta, endpoint_for_resource_type, new_id, resource_type_for_endpoint, version_for_id,
    AppState, ServerState,
};
use crate::validation::missing_required_attribute;

fn content_type(state: &ServerState) -> &'static str {
    if state.config.content_type_json {
        "application/json"
    } else {
        "application/scim+json"
    }
}

fn json_response(status: u16, body: Value, state: &ServerState) -> Response {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, content_type(state))],
        Json(body),
    )
        .into_response()
}

fn error_response(status: u16, detail: impl Into<String>, state: &ServerState) -> Response {
    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
        "status": status.to_string(),
        "detail": detail.into(),
    });
    json_response(status, body, state)
}

fn throttled_response() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "0")]).into_response()
}

/// Consume one unit of throttle budget if any remains. Returns `Some` with
/// the 429 response to send when the caller should stop and return it.
fn take_throttle(state: &mut ServerState) -> Option<Response> {
    if state.throttle_remaining > 0 {
        state.throttle_remaining -= 1;
        return Some(throttled_response());
    }
    None
}

/// Strip `password` unless `password_in_response` is set, and `id` when
/// `missing_id` is set. The canonical stored document always has both;
/// this is applied only at response time.
fn render_resource(state: &ServerState, stored: &Value) -> Value {
    let mut out = stored.clone();
    if let Some(obj) = out.as_object_mut() {
        if state.config.missing_id {
            obj.remove("id");
        }
        if !state.config.password_in_response {
            obj.remove("password");
        }
    }
    out
}

fn resource_location(resource: &Value) -> Option<String> {
    resource
        .get("meta")
        .and_then(|m| m.get("location"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn resource_version(resource: &Value) -> Option<String> {
    resource
        .get("meta")
        .and_then(|m| m.get("version"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

pub async fn get_service_provider_config(State(app): State<AppState>) -> Response {
    let state = app.inner.lock().await;
    let body = discovery::service_provider_config(&state.base_url);
    json_response(200, body, &state)
}

pub async fn get_schemas(State(app): State<AppState>) -> Response {
    let state = app.inner.lock().await;
    json_response(200, discovery::schemas_list_response(), &state)
}

pub async fn get_resource_types(State(app): State<AppState>) -> Response {
    let state = app.inner.lock().await;
    let body = discovery::resource_types_list_response(&state.config, &state.base_url);
    json_response(200, body, &state)
}

// ---------------------------------------------------------------------------
// List / Create
// ---------------------------------------------------------------------------

pub async fn list_resources(
    State(app): State<AppState>,
    Path(endpoint_owned): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let endpoint: &'static str = match endpoint_owned.as_str() {
        "Users" => "Users",
        "Groups" => "Groups",
        "Agents" => "Agents",
        "AgenticApplications" => "AgenticApplications",
        _ => return (StatusCode::NOT_FOUND).into_response(),
    };
    let mut state = app.inner.lock().await;

    if let Some(resp) = take_throttle(&mut state) {
        return resp;
    }

    let Some(resource_type) = resource_type_for_endpoint(endpoint) else {
        return (StatusCode::NOT_FOUND).into_response();
    };
    if !state.config.supports(resource_type) {
        return (StatusCode::NOT_FOUND).into_response();
    }

    if query.contains_key("filter") && state.config.reject_filters {
        return error_response(400, "filtering is not supported", &state);
    }

    let collection = state.collections.get(endpoint).cloned().unwrap_or_default();
    let total = collection.len();

    let start_index: usize = query
        .get("startIndex")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
        .max(1);
    let count: Option<usize> = query.get("count").and_then(|v| v.parse().ok());

    // `filter` is accepted syntactically but never evaluated (non-goal, per
    // `spec.md` §1): every non-rejecting request returns the full (paged)
    // collection regardless of the filter value, which the probe treats as
    // an acceptable "200 + all results" outcome.
    let mut values: Vec<Value> = collection
        .values()
        .map(|stored| render_resource(&state, stored))
        .collect();

    let skip = start_index.saturating_sub(1);
    values = values.split_off(skip.min(values.len()));
    if let Some(count) = count {
        values.truncate(count);
    }
    let items_per_page = values.len();

    let body = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
        "totalResults": total,
        "itemsPerPage": items_per_page,
        "startIndex": start_index,
        "Resources": values,
    });
    json_response(200, body, &state)
}

pub async fn create_resource(
    State(app): State<AppState>,
    Path(endpoint_owned): Path<String>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let endpoint: &'static str = match endpoint_owned.as_str() {
        "Users" => "Users",
        "Groups" => "Groups",
        "Agents" => "Agents",
        "AgenticApplications" => "AgenticApplications",
        _ => return (StatusCode::NOT_FOUND).into_response(),
    };
    let mut state = app.inner.lock().await;

    if let Some(resp) = take_throttle(&mut state) {
        return resp;
    }

    let Some(resource_type) = resource_type_for_endpoint(endpoint) else {
        return (StatusCode::NOT_FOUND).into_response();
    };
    if !state.config.supports(resource_type) {
        return (StatusCode::NOT_FOUND).into_response();
    }

    // `SPEC_FULL.md` §3 content-type diagnostic: accept both, as RFC 7644
    // §8.2 requires — rejecting `application/json` here would defeat the
    // probe's own diagnostic step instead of exercising it.
    let declared_ct = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !declared_ct.is_empty()
        && !declared_ct.contains("scim+json")
        && !declared_ct.contains("application/json")
    {
        return error_response(400, "unsupported Content-Type", &state);
    }

    if let Some(detail) = missing_required_attribute(resource_type, &body) {
        return error_response(400, detail, &state);
    }

    let id = new_id();
    let mut document = body.as_object().cloned().unwrap_or_default();
    document.insert("id".to_string(), Value::String(id.clone()));
    let meta = build_meta(&state.config, &state.base_url, endpoint, resource_type, &id, None);
    if let Some(meta) = meta {
        document.insert("meta".to_string(), meta);
    }
    let stored = Value::Object(document);

    state
        .collections
        .entry(endpoint)
        .or_default()
        .insert(id.clone(), stored.clone());

    info!(target: "scim.server", resource_type, id, "created resource");

    let response_body = render_resource(&state, &stored);
    let mut response = json_response(201, response_body, &state);
    if let Some(location) = resource_location(&stored) {
        response
            .headers_mut()
            .insert(header::LOCATION, location.parse().unwrap());
    }
    if let Some(version) = resource_version(&stored) {
        response.headers_mut().insert(header::ETAG, version.parse().unwrap());
    }
    response
}

// ---------------------------------------------------------------------------
// Single-resource GET / PUT / PATCH / DELETE
// ---------------------------------------------------------------------------

pub async fn get_resource(
    State(app): State<AppState>,
    Path((endpoint_owned, id)): Path<(String, String)>,
) -> Response {
    let endpoint: &'static str = match endpoint_owned.as_str() {
        "Users" => "Users",
        "Groups" => "Groups",
        "Agents" => "Agents",
        "AgenticApplications" => "AgenticApplications",
        _ => return (StatusCode::NOT_FOUND).into_response(),
    };
    let mut state = app.inner.lock().await;

    if let Some(resp) = take_throttle(&mut state) {
        return resp;
    }

    let key = (endpoint.to_string(), id.clone());
    if let Some(stale) = state.stale_snapshots.remove(&key) {
        return json_response(200, render_resource(&state, &stale), &state);
    }

    let Some(stored) = state.collections.get(endpoint).and_then(|c| c.get(&id)).cloned() else {
        return error_response(404, format!("no such resource: {id}"), &state);
    };
    let body = render_resource(&state, &stored);
    let mut response = json_response(200, body, &state);
    if let Some(version) = resource_version(&stored) {
        response.headers_mut().insert(header::ETAG, version.parse().unwrap());
    }
    response
}

pub async fn put_resource(
    State(app): State<AppState>,
    Path((endpoint_owned, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let endpoint: &'static str = match endpoint_owned.as_str() {
        "Users" => "Users",
        "Groups" => "Groups",
        "Agents" => "Agents",
        "AgenticApplications" => "AgenticApplications",
        _ => return (StatusCode::NOT_FOUND).into_response(),
    };
    let mut state = app.inner.lock().await;

    if let Some(resp) = take_throttle(&mut state) {
        return resp;
    }

    let Some(resource_type) = resource_type_for_endpoint(endpoint) else {
        return (StatusCode::NOT_FOUND).into_response();
    };

    let Some(existing) = state.collections.get(endpoint).and_then(|c| c.get(&id)).cloned() else {
        return error_response(404, format!("no such resource: {id}"), &state);
    };

    if let Some(detail) = missing_required_attribute(resource_type, &body) {
        return error_response(400, detail, &state);
    }

    let existing_created = existing
        .get("meta")
        .and_then(|m| m.get("created"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut document = body.as_object().cloned().unwrap_or_default();
    document.insert("id".to_string(), Value::String(id.clone()));
    let meta = build_meta(
        &state.config,
        &state.base_url,
        endpoint,
        resource_type,
        &id,
        existing_created.as_deref(),
    );
    if let Some(meta) = meta {
        document.insert("meta".to_string(), meta);
    }
    let updated = Value::Object(document);

    if state.config.stale_after_put {
        state
            .stale_snapshots
            .insert((endpoint.to_string(), id.clone()), existing);
    }

    state
        .collections
        .entry(endpoint)
        .or_default()
        .insert(id.clone(), updated.clone());

    let response_body = render_resource(&state, &updated);
    let mut response = json_response(200, response_body, &state);
    if let Some(version) = resource_version(&updated) {
        response.headers_mut().insert(header::ETAG, version.parse().unwrap());
    }
    response
}

/// Apply SCIM PatchOp operations at the top level only: no dotted-path or
/// filter-expression evaluation (`spec.md` §1 Non-goals — "does not
/// implement SCIM filter parsing"; `SPEC_FULL.md` §3).
fn apply_patch_ops(document: &mut Map<String, Value>, operations: &[Value]) -> Result<(), String> {
    for op in operations {
        let verb = op.get("op").and_then(Value::as_str).unwrap_or("");
        let path = op.get("path").and_then(Value::as_str);
        match verb {
            "add" | "replace" => {
                let Some(path) = path else {
                    return Err("add/replace requires 'path' on this server".to_string());
                };
                let Some(value) = op.get("value") else {
                    return Err("add/replace requires 'value'".to_string());
                };
                document.insert(path.to_string(), value.clone());
            }
            "remove" => {
                let Some(path) = path else {
                    return Err("remove requires 'path'".to_string());
                };
                document.remove(path);
            }
            other => return Err(format!("unsupported patch op '{other}'")),
        }
    }
    Ok(())
}

pub async fn patch_resource(
    State(app): State<AppState>,
    Path((endpoint_owned, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let endpoint: &'static str = match endpoint_owned.as_str() {
        "Users" => "Users",
        "Groups" => "Groups",
        "Agents" => "Agents",
        "AgenticApplications" => "AgenticApplications",
        _ => return (StatusCode::NOT_FOUND).into_response(),
    };
    let mut state = app.inner.lock().await;

    if let Some(resp) = take_throttle(&mut state) {
        return resp;
    }

    let Some(resource_type) = resource_type_for_endpoint(endpoint) else {
        return (StatusCode::NOT_FOUND).into_response();
    };

    let Some(existing) = state.collections.get(endpoint).and_then(|c| c.get(&id)).cloned() else {
        return error_response(404, format!("no such resource: {id}"), &state);
    };

    let operations = match body.get("Operations").and_then(Value::as_array) {
        Some(ops) if !ops.is_empty() => ops.clone(),
        _ => return error_response(400, "'Operations' is required and must be non-empty", &state),
    };

    let mut document = existing.as_object().cloned().unwrap_or_default();
    if let Err(detail) = apply_patch_ops(&mut document, &operations) {
        return error_response(400, detail, &state);
    }

    let existing_created = existing
        .get("meta")
        .and_then(|m| m.get("created"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let meta = build_meta(
        &state.config,
        &state.base_url,
        endpoint,
        resource_type,
        &id,
        existing_created.as_deref(),
    );
    if let Some(meta) = meta {
        document.insert("meta".to_string(), meta);
    }
    document.insert("id".to_string(), Value::String(id.clone()));
    let updated = Value::Object(document);

    state
        .collections
        .entry(endpoint)
        .or_default()
        .insert(id.clone(), updated.clone());

    let response_body = render_resource(&state, &updated);
    let mut response = json_response(200, response_body, &state);
    if let Some(version) = resource_version(&updated) {
        response.headers_mut().insert(header::ETAG, version.parse().unwrap());
    }
    response
}

pub async fn delete_resource(
    State(app): State<AppState>,
    Path((endpoint_owned, id)): Path<(String, String)>,
) -> Response {
    let endpoint: &'static str = match endpoint_owned.as_str() {
        "Users" => "Users",
        "Groups" => "Groups",
        "Agents" => "Agents",
        "AgenticApplications" => "AgenticApplications",
        _ => return (StatusCode::NOT_FOUND).into_response(),
    };
    let mut state = app.inner.lock().await;

    if let Some(resp) = take_throttle(&mut state) {
        return resp;
    }

    let removed = state
        .collections
        .get_mut(endpoint)
        .and_then(|c| c.remove(&id))
        .is_some();
    state.stale_snapshots.remove(&(endpoint.to_string(), id.clone()));

    if removed {
        warn!(target: "scim.server", endpoint, id, "deleted resource");
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(404, format!("no such resource: {id}"), &state)
    }
}
