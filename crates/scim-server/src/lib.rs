//! In-process reference SCIM server used to drive `scim-probe`'s test
//! suite (`spec.md` §4.7). Bound to `127.0.0.1` on an OS-assigned port;
//! never intended to serve real traffic.
//!
//! Built on `axum`, following the router-plus-shared-state shape of the
//! teacher's daemon: one [`AppState`] clone per handler, a single coarse
//! lock around the mutable bits (`spec.md` §5), and routes registered with
//! a dynamic `{endpoint}` segment so the four resource types share one set
//! of handlers instead of one copy-pasted per type.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod discovery;
mod routes;
mod state;
mod validation;

pub use config::ServerConfig;
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use scim_error::{ErrorCode, ScimError};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the Axum router for the reference server.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/ServiceProviderConfig", get(routes::get_service_provider_config))
        .route("/Schemas", get(routes::get_schemas))
        .route("/ResourceTypes", get(routes::get_resource_types))
        .route(
            "/{endpoint}",
            get(routes::list_resources).post(routes::create_resource),
        )
        .route(
            "/{endpoint}/{id}",
            get(routes::get_resource)
                .put(routes::put_resource)
                .patch(routes::patch_resource)
                .delete(routes::delete_resource),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A running reference server instance. Dropping this does not stop the
/// server — call [`ServerHandle::shutdown`] or let the process exit.
pub struct ServerHandle {
    /// Base URL the server is reachable at, e.g. `http://127.0.0.1:54321`.
    pub base_url: String,
    join: JoinHandle<()>,
}

impl ServerHandle {
    /// Abort the background task serving this instance.
    pub fn shutdown(self) {
        self.join.abort();
    }
}

/// Bind to `127.0.0.1:0` (an OS-assigned port) and serve `config` in a
/// background task, matching `abp-daemon`'s `tests/api_tests.rs` pattern of
/// `TcpListener::bind` + `tokio::spawn(axum::serve(...))`.
pub async fn spawn(config: ServerConfig) -> Result<ServerHandle, ScimError> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| ScimError::new(ErrorCode::ServerBindFailed, e.to_string()).with_source(e))?;
    let addr: SocketAddr = listener
        .local_addr()
        .map_err(|e| ScimError::new(ErrorCode::ServerBindFailed, e.to_string()).with_source(e))?;
    let base_url = format!("http://{addr}");

    let state = AppState::new(config, base_url.clone());
    let app = build_app(state);

    info!(target: "scim.server", %base_url, "reference server listening");
    let join = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(target: "scim.server", error = %e, "reference server exited");
        }
    });

    Ok(ServerHandle { base_url, join })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn client() -> (ServerHandle, reqwest::Client) {
        let handle = spawn(ServerConfig::conformant()).await.expect("spawn server");
        (handle, reqwest::Client::new())
    }

    #[tokio::test]
    async fn discovery_endpoints_return_200_scim_json() {
        let (server, client) = client().await;
        for path in ["/ServiceProviderConfig", "/Schemas", "/ResourceTypes"] {
            let resp = client
                .get(format!("{}{path}", server.base_url))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200, "{path}");
            assert_eq!(
                resp.headers().get("content-type").unwrap(),
                "application/scim+json"
            );
        }
        server.shutdown();
    }

    #[tokio::test]
    async fn full_user_crud_lifecycle_round_trips() {
        let (server, client) = client().await;

        let create = client
            .post(format!("{}/Users", server.base_url))
            .json(&json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "alice@example.com",
                "displayName": "Alice",
                "active": true,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(create.status(), 201);
        assert!(create.headers().get("location").is_some());
        assert!(create.headers().get("etag").is_some());
        let body: serde_json::Value = create.json().await.unwrap();
        let id = body["id"].as_str().unwrap().to_string();
        assert_eq!(body["meta"]["resourceType"], "User");

        let get = client
            .get(format!("{}/Users/{id}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(get.status(), 200);

        let put = client
            .put(format!("{}/Users/{id}", server.base_url))
            .json(&json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "alice@example.com",
                "displayName": "Updated-Alice",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(put.status(), 200);
        let put_body: serde_json::Value = put.json().await.unwrap();
        assert_eq!(put_body["displayName"], "Updated-Alice");

        let patch = client
            .patch(format!("{}/Users/{id}", server.base_url))
            .json(&json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
                "Operations": [{"op": "replace", "path": "active", "value": false}],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(patch.status(), 200);
        let patch_body: serde_json::Value = patch.json().await.unwrap();
        assert_eq!(patch_body["active"], false);

        let delete = client
            .delete(format!("{}/Users/{id}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(delete.status(), 204);

        let after_delete = client
            .get(format!("{}/Users/{id}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(after_delete.status(), 404);

        server.shutdown();
    }

    #[tokio::test]
    async fn post_missing_username_is_rejected_with_400() {
        let (server, client) = client().await;
        let resp = client
            .post(format!("{}/Users", server.base_url))
            .json(&json!({"schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"]}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["schemas"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s == "urn:ietf:params:scim:api:messages:2.0:Error"));
        server.shutdown();
    }

    #[tokio::test]
    async fn unsupported_resource_type_returns_404() {
        let mut config = ServerConfig::conformant();
        config.supported_resources = vec!["User".to_string()];
        let server = spawn(config).await.unwrap();
        let client = reqwest::Client::new();
        let resp = client
            .post(format!("{}/Agents", server.base_url))
            .json(&json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Agent"],
                "name": "a",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        server.shutdown();
    }

    #[tokio::test]
    async fn throttle_count_returns_429_then_recovers() {
        let mut config = ServerConfig::conformant();
        config.throttle_count = 2;
        let server = spawn(config).await.unwrap();
        let client = reqwest::Client::new();

        for _ in 0..2 {
            let resp = client
                .get(format!("{}/Schemas", server.base_url))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 429);
            assert_eq!(resp.headers().get("retry-after").unwrap(), "0");
        }
        let resp = client
            .get(format!("{}/Schemas", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        server.shutdown();
    }

    #[tokio::test]
    async fn missing_meta_knob_omits_meta_entirely() {
        let mut config = ServerConfig::conformant();
        config.missing_meta = true;
        let server = spawn(config).await.unwrap();
        let client = reqwest::Client::new();
        let resp = client
            .post(format!("{}/Users", server.base_url))
            .json(&json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "bob@example.com",
            }))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body.get("meta").is_none());
        server.shutdown();
    }

    #[tokio::test]
    async fn stale_after_put_replays_pre_put_snapshot_once() {
        let mut config = ServerConfig::conformant();
        config.stale_after_put = true;
        let server = spawn(config).await.unwrap();
        let client = reqwest::Client::new();

        let create = client
            .post(format!("{}/Users", server.base_url))
            .json(&json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "carol@example.com",
                "displayName": "Original",
            }))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = create.json().await.unwrap();
        let id = body["id"].as_str().unwrap().to_string();

        client
            .put(format!("{}/Users/{id}", server.base_url))
            .json(&json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": "carol@example.com",
                "displayName": "Updated",
            }))
            .send()
            .await
            .unwrap();

        let first_get = client
            .get(format!("{}/Users/{id}", server.base_url))
            .send()
            .await
            .unwrap();
        let first_body: serde_json::Value = first_get.json().await.unwrap();
        assert_eq!(first_body["displayName"], "Original");

        let second_get = client
            .get(format!("{}/Users/{id}", server.base_url))
            .send()
            .await
            .unwrap();
        let second_body: serde_json::Value = second_get.json().await.unwrap();
        assert_eq!(second_body["displayName"], "Updated");

        server.shutdown();
    }

    #[tokio::test]
    async fn reject_filters_responds_400() {
        let mut config = ServerConfig::conformant();
        config.reject_filters = true;
        let server = spawn(config).await.unwrap();
        let client = reqwest::Client::new();
        let resp = client
            .get(format!("{}/Users?filter=userName%20eq%20%22x%22", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        server.shutdown();
    }

    #[tokio::test]
    async fn content_type_json_knob_advertises_application_json() {
        let mut config = ServerConfig::conformant();
        config.content_type_json = true;
        let server = spawn(config).await.unwrap();
        let client = reqwest::Client::new();
        let resp = client
            .get(format!("{}/Schemas", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.headers().get("content-type").unwrap(), "application/json");
        server.shutdown();
    }
}
