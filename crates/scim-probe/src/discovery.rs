//! Phase 1 — discovery endpoints, plus resource-type capability detection.

use std::collections::HashSet;

use scim_report::ProbeResult;
use scim_transport::HttpTransport;

const PHASE: &str = "Phase 1 — Discovery";

/// Probe the three discovery endpoints (RFC 7644 §4): each must return 200
/// with an `application/scim+json` body. `application/json` passes but, in
/// strict mode, also emits a WARN.
pub async fn test_discovery(transport: &dyn HttpTransport, strict: bool) -> Vec<ProbeResult> {
    let mut results = Vec::new();

    for (path, name) in [
        ("/ServiceProviderConfig", "GET /ServiceProviderConfig"),
        ("/Schemas", "GET /Schemas"),
        ("/ResourceTypes", "GET /ResourceTypes"),
    ] {
        match transport.get(path).await {
            Ok(resp) if resp.status == 200 => {
                let ct = resp.header("Content-Type").unwrap_or("");
                if ct.contains("scim+json") {
                    results.push(ProbeResult::pass(name, PHASE));
                } else if ct.contains("application/json") {
                    results.push(ProbeResult::pass(name, PHASE));
                    if strict {
                        results.push(ProbeResult::warn(
                            name,
                            PHASE,
                            format!("Content-Type should be application/scim+json, got '{ct}'"),
                        ));
                    }
                } else {
                    results.push(ProbeResult::fail(
                        name,
                        PHASE,
                        format!("Content-Type should be application/scim+json, got '{ct}'"),
                    ));
                }
            }
            Ok(resp) => results.push(ProbeResult::fail(
                name,
                PHASE,
                format!("Expected 200, got {}", resp.status),
            )),
            Err(e) => results.push(ProbeResult::error(name, PHASE, e.to_string())),
        }
    }

    results
}

/// Learn which resource types the server supports from `/ResourceTypes`.
/// Falls back to `{User, Group}` — the two RFC 7644 mandates — if the
/// endpoint is unavailable or unparseable.
pub async fn discover_supported_resources(transport: &dyn HttpTransport) -> HashSet<String> {
    let fallback = || ["User", "Group"].iter().map(|s| s.to_string()).collect();

    let Ok(resp) = transport.get("/ResourceTypes").await else {
        return fallback();
    };
    if resp.status != 200 {
        return fallback();
    }
    let Some(data) = resp.json() else {
        return fallback();
    };

    let resources = if data.is_array() {
        data.as_array()
    } else {
        data.get("Resources").and_then(|v| v.as_array())
    };

    match resources {
        Some(list) => {
            let names: HashSet<String> = list
                .iter()
                .filter_map(|r| r.get("name").and_then(|n| n.as_str()))
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                fallback()
            } else {
                names
            }
        }
        None => fallback(),
    }
}
