//! Shared, lock-protected state behind the reference server's handlers.
//!
//! `spec.md` §5: "a single coarse lock around the whole handler body
//! satisfies the need" — tests are sequential and throughput is trivial,
//! so [`ServerState`] lives behind one `tokio::sync::Mutex`, not
//! per-resource locks.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::ServerConfig;

/// One resource collection, keyed by server-generated id.
pub type Collection = BTreeMap<String, Value>;

/// Everything the handler body needs, behind one lock.
pub struct ServerState {
    /// Non-conformance knobs and supported-resource list.
    pub config: ServerConfig,
    /// `endpoint name ("Users") -> (id -> resource document)`.
    pub collections: BTreeMap<&'static str, Collection>,
    /// Remaining 429 responses to issue before behaving normally.
    pub throttle_remaining: u32,
    /// Pre-PUT snapshots owed to the next GET, keyed by `(endpoint, id)`.
    /// Consumed (removed) the first time that resource is read.
    pub stale_snapshots: BTreeMap<(String, String), Value>,
    /// Base URL this server is reachable at, used to populate `meta.location`.
    pub base_url: String,
}

/// Shared handle to [`ServerState`], cloned into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The lock-protected state.
    pub inner: Arc<Mutex<ServerState>>,
}

impl AppState {
    /// Build fresh, empty state for `base_url` with the given config.
    pub fn new(config: ServerConfig, base_url: impl Into<String>) -> Self {
        let mut collections = BTreeMap::new();
        for endpoint in ["Users", "Groups", "Agents", "AgenticApplications"] {
            collections.insert(endpoint, Collection::new());
        }
        let throttle_remaining = config.throttle_count;
        Self {
            inner: Arc::new(Mutex::new(ServerState {
                config,
                collections,
                throttle_remaining,
                stale_snapshots: BTreeMap::new(),
                base_url: base_url.into(),
            })),
        }
    }
}

/// Endpoint name ("Users") for a resource type name ("User"), or `None`
/// if it isn't one of the four core resource types this server hosts.
pub fn endpoint_for_resource_type(resource_type: &str) -> Option<&'static str> {
    match resource_type {
        "User" => Some("Users"),
        "Group" => Some("Groups"),
        "Agent" => Some("Agents"),
        "AgenticApplication" => Some("AgenticApplications"),
        _ => None,
    }
}

/// Inverse of [`endpoint_for_resource_type`].
pub fn resource_type_for_endpoint(endpoint: &str) -> Option<&'static str> {
    match endpoint {
        "Users" => Some("User"),
        "Groups" => Some("Group"),
        "Agents" => Some("Agent"),
        "AgenticApplications" => Some("AgenticApplication"),
        _ => None,
    }
}

/// Generate a fresh server-side id.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Weak ETag derived from the first 8 hex characters of `id`
/// (`mock_scim_server.py::_make_meta`).
pub fn version_for_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("W/\"{prefix}\"")
}

/// Strip the surrounding `W/"..."` or `"..."` wrapper from an ETag/version
/// value, for comparison purposes.
pub fn strip_etag_quoting(value: &str) -> &str {
    let value = value.strip_prefix("W/").unwrap_or(value);
    value.trim_matches('"')
}

/// Build a `meta` object for `resource_type`/`id`, honouring
/// `missing_meta`/`missing_meta_fields`. `created` is reused from
/// `existing_created` on update so it never appears to move.
pub fn build_meta(
    config: &ServerConfig,
    base_url: &str,
    endpoint: &str,
    resource_type: &str,
    id: &str,
    existing_created: Option<&str>,
) -> Option<Value> {
    if config.missing_meta {
        return None;
    }
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let created = existing_created.map(str::to_string).unwrap_or_else(|| now.clone());

    let mut meta = Map::new();
    let omit = |field: &str| config.missing_meta_fields.iter().any(|f| f == field);
    if !omit("resourceType") {
        meta.insert("resourceType".to_string(), Value::String(resource_type.to_string()));
    }
    if !omit("created") {
        meta.insert("created".to_string(), Value::String(created));
    }
    if !omit("lastModified") {
        meta.insert("lastModified".to_string(), Value::String(now));
    }
    if !omit("location") {
        meta.insert(
            "location".to_string(),
            Value::String(format!("{base_url}/{endpoint}/{id}")),
        );
    }
    if !omit("version") {
        meta.insert("version".to_string(), Value::String(version_for_id(id)));
    }
    Some(Value::Object(meta))
}
