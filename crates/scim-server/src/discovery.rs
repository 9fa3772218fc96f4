//! Static discovery endpoint bodies (`spec.md` §4.7, supplemented per
//! `mock_scim_server.py` — see `SPEC_FULL.md` §3).

use serde_json::{json, Value};

use crate::config::ServerConfig;

/// `GET /ServiceProviderConfig` body.
pub fn service_provider_config(base_url: &str) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig"],
        "documentationUri": format!("{base_url}/docs"),
        "patch": { "supported": true },
        "bulk": { "supported": false, "maxOperations": 0, "maxPayloadSize": 0 },
        "filter": { "supported": true, "maxResults": 200 },
        "changePassword": { "supported": false },
        "sort": { "supported": false },
        "etag": { "supported": true },
        "authenticationSchemes": [
            {
                "type": "oauthbearertoken",
                "name": "OAuth Bearer Token",
                "description": "Authentication via bearer token",
                "specUri": "urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig",
                "primary": true,
            }
        ],
    })
}

/// `GET /Schemas` body: a `ListResponse` enumerating every schema the
/// registry publishes.
pub fn schemas_list_response() -> Value {
    let resources: Vec<Value> = scim_schema::schema_urns()
        .filter_map(scim_schema::get_schema)
        .map(|schema| {
            json!({
                "id": schema.urn,
                "name": schema.name,
                "description": schema.description,
            })
        })
        .collect();
    json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
        "totalResults": resources.len(),
        "itemsPerPage": resources.len(),
        "startIndex": 1,
        "Resources": resources,
    })
}

/// `GET /ResourceTypes` body: a `ListResponse` enumerating only the
/// resource types this config's `supported_resources` advertises.
pub fn resource_types_list_response(config: &ServerConfig, base_url: &str) -> Value {
    let known: &[(&str, &str, &str)] = &[
        (
            "User",
            "/Users",
            "urn:ietf:params:scim:schemas:core:2.0:User",
        ),
        (
            "Group",
            "/Groups",
            "urn:ietf:params:scim:schemas:core:2.0:Group",
        ),
        (
            "Agent",
            "/Agents",
            "urn:ietf:params:scim:schemas:core:2.0:Agent",
        ),
        (
            "AgenticApplication",
            "/AgenticApplications",
            "urn:ietf:params:scim:schemas:core:2.0:AgenticApplication",
        ),
    ];
    let resources: Vec<Value> = known
        .iter()
        .filter(|(name, _, _)| config.supports(name))
        .map(|(name, endpoint, urn)| {
            json!({
                "id": name,
                "name": name,
                "endpoint": endpoint,
                "schema": urn,
            })
        })
        .collect();
    json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
        "totalResults": resources.len(),
        "itemsPerPage": resources.len(),
        "startIndex": 1,
        "Resources": resources,
        "documentationUri": format!("{base_url}/docs/resource-types"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_types_respects_supported_resources() {
        let mut config = ServerConfig::conformant();
        config.supported_resources = vec!["User".to_string()];
        let body = resource_types_list_response(&config, "http://x");
        let names: Vec<&str> = body["Resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["User"]);
        assert_eq!(body["totalResults"], 1);
    }

    #[test]
    fn schemas_list_enumerates_the_full_registry() {
        let body = schemas_list_response();
        let count = body["Resources"].as_array().unwrap().len();
        assert_eq!(count, scim_schema::schema_urns().count());
    }

    #[test]
    fn service_provider_config_advertises_patch_and_etag_support() {
        let body = service_provider_config("http://x");
        assert_eq!(body["patch"]["supported"], true);
        assert_eq!(body["etag"]["supported"], true);
    }
}
