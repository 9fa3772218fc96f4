//! Phase 6 — ListResponse shape, filtering, and pagination.

use scim_report::ProbeResult;
use scim_transport::HttpTransport;
use scim_validate::response::ResponseValidator;

use crate::helpers::validation_results;

const PHASE: &str = "Phase 6 — Search";

/// Percent-encode a query-string value using the RFC 3986 unreserved set.
/// Scoped to filter strings this crate constructs itself, not arbitrary
/// untrusted input.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Exercise `/Users` listing: bare list shape, a no-match filter, a
/// pagination request, and the `count=0` boundary.
pub async fn test_search(
    transport: &dyn HttpTransport,
    validator: &ResponseValidator,
) -> Vec<ProbeResult> {
    let mut results = Vec::new();

    match transport.get("/Users").await {
        Ok(resp) => {
            let (ok, errs) = validator.validate_list(resp.json(), resp.status);
            results.extend(validation_results(
                "GET /Users (ListResponse)",
                PHASE,
                ok,
                errs,
                "",
            ));
        }
        Err(e) => results.push(ProbeResult::error(
            "GET /Users (ListResponse)",
            PHASE,
            e.to_string(),
        )),
    }

    let filter_val = encode_query_value(r#"userName eq "nonexistent@test.invalid""#);
    match transport.get(&format!("/Users?filter={filter_val}")).await {
        Ok(resp) => {
            let data = resp.json();
            let name = "GET /Users?filter (no match)";
            let total_results = data.and_then(|d| d.get("totalResults")).and_then(|v| v.as_i64());
            if resp.status == 200 && total_results == Some(0) {
                results.push(ProbeResult::pass(name, PHASE));
            } else if resp.status == 200 {
                results.push(ProbeResult::pass_with(
                    name,
                    PHASE,
                    "Filter returned results (server may ignore filter)",
                ));
            } else if resp.status == 400 {
                results.push(ProbeResult::warn(
                    name,
                    PHASE,
                    "Server rejected filter with 400 (partial filter support)",
                ));
            } else {
                results.push(ProbeResult::fail(
                    name,
                    PHASE,
                    format!("Expected 200, got {}", resp.status),
                ));
            }
        }
        Err(e) => results.push(ProbeResult::error(
            "GET /Users?filter (no match)",
            PHASE,
            e.to_string(),
        )),
    }

    match transport.get("/Users?startIndex=1&count=1").await {
        Ok(resp) if resp.status == 200 => {
            results.push(ProbeResult::pass("GET /Users?startIndex=1&count=1", PHASE));
            if let Some(items_per_page) = resp
                .json()
                .and_then(|d| d.get("itemsPerPage"))
                .and_then(|v| v.as_i64())
            {
                if items_per_page > 1 {
                    results.push(ProbeResult::warn(
                        "Pagination: itemsPerPage honors count",
                        PHASE,
                        format!("Requested count=1 but itemsPerPage={items_per_page}"),
                    ));
                }
            }
        }
        Ok(resp) => results.push(ProbeResult::fail(
            "GET /Users?startIndex=1&count=1",
            PHASE,
            format!("Expected 200, got {}", resp.status),
        )),
        Err(e) => results.push(ProbeResult::error(
            "GET /Users?startIndex=1&count=1",
            PHASE,
            e.to_string(),
        )),
    }

    let boundary_name = "GET /Users?count=0 (boundary)";
    match transport.get("/Users?count=0").await {
        Ok(resp) if resp.status == 200 => {
            let empty = resp
                .json()
                .and_then(|d| d.get("Resources"))
                .and_then(|r| r.as_array())
                .is_some_and(Vec::is_empty);
            if empty {
                results.push(ProbeResult::pass(boundary_name, PHASE));
            } else {
                results.push(ProbeResult::warn(
                    boundary_name,
                    PHASE,
                    "count=0 should return no Resources",
                ));
            }
        }
        Ok(resp) => results.push(ProbeResult::warn(
            boundary_name,
            PHASE,
            format!("Expected 200, got {}", resp.status),
        )),
        Err(e) => results.push(ProbeResult::error(boundary_name, PHASE, e.to_string())),
    }

    results
}
