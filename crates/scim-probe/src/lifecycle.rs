//! Generic POST-GET-PUT-PATCH-DELETE sequence shared by every resource type.

use std::collections::BTreeMap;
use std::time::Duration;

use scim_factory::make_patch;
use scim_report::ProbeResult;
use scim_transport::{HttpTransport, Headers};
use scim_validate::response::ResponseValidator;
use serde_json::Value;

use crate::helpers::validation_results;

/// A resource this run created on the target server, tracked so it can be
/// deleted during cleanup even if the lifecycle that created it never got
/// as far as its own DELETE step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedResource {
    /// Collection endpoint, e.g. `/Users`.
    pub endpoint: String,
    /// Server-assigned resource id.
    pub id: String,
}

fn header_view(headers: &Headers) -> BTreeMap<&str, &str> {
    headers.iter().collect()
}

/// Retry a POST that returned 500 after a brief delay, to distinguish
/// transient instability from a structural failure before escalating to
/// content-type diagnosis.
async fn retry_post_on_500(
    transport: &dyn HttpTransport,
    endpoint: &str,
    payload: &Value,
) -> Option<scim_transport::HttpResponse> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    let resp = transport.post(endpoint, payload, None).await.ok()?;
    if resp.status == 200 || resp.status == 201 {
        Some(resp)
    } else {
        None
    }
}

/// When a POST returns a consistent 500, retry with `Content-Type:
/// application/json` to determine whether the server is rejecting
/// `application/scim+json` requests. Cleans up any resource created by the
/// diagnostic retry itself.
async fn diagnose_content_type_rejection(
    transport: &dyn HttpTransport,
    endpoint: &str,
    payload: &Value,
    created: &mut Vec<CreatedResource>,
) -> Option<String> {
    let mut extra = Headers::new();
    extra.insert("Content-Type", "application/json");
    let resp = transport.post(endpoint, payload, Some(extra)).await.ok()?;
    if resp.status != 200 && resp.status != 201 {
        return None;
    }
    if let Some(id) = resp.json().and_then(|b| b.get("id")).and_then(Value::as_str) {
        let del_ok = transport
            .delete(&format!("{endpoint}/{id}"))
            .await
            .map(|r| r.status == 204)
            .unwrap_or(false);
        if !del_ok {
            created.push(CreatedResource {
                endpoint: endpoint.to_string(),
                id: id.to_string(),
            });
        }
    }
    Some(
        "Server rejected Content-Type: application/scim+json with 500 but accepted \
         application/json — server MUST accept application/scim+json per RFC 7644 §8.2"
            .to_string(),
    )
}

/// Run a full CRUD lifecycle for one resource type: POST (201) -> GET (200)
/// -> PUT (200, verified) -> PATCH (200, verified) -> DELETE (204) -> GET
/// (404). For `Group`, also exercises PATCH add/remove on `members`.
///
/// Resources this creates are appended to `created` for cleanup; a
/// successful in-sequence DELETE removes its own entry to avoid a
/// double-delete later.
#[allow(clippy::too_many_arguments)]
pub async fn crud_lifecycle(
    transport: &dyn HttpTransport,
    validator: &ResponseValidator,
    resource_type: &str,
    endpoint: &str,
    payload: Value,
    phase: &str,
    created: &mut Vec<CreatedResource>,
    display_name_field: &str,
) -> Vec<ProbeResult> {
    let mut results = Vec::new();

    let post_name = format!("POST {endpoint}");
    let mut resp = match transport.post(endpoint, &payload, None).await {
        Ok(resp) => resp,
        Err(e) => {
            results.push(ProbeResult::error(post_name, phase, e.to_string()));
            return results;
        }
    };

    if resp.status == 500 {
        if let Some(retried) = retry_post_on_500(transport, endpoint, &payload).await {
            results.push(ProbeResult::warn(
                &post_name,
                phase,
                "Server returned 500 on first attempt but succeeded on retry — server has \
                 transient instability (RFC 7644 §3.3 requires reliable 201)",
            ));
            resp = retried;
        } else if let Some(hint) =
            diagnose_content_type_rejection(transport, endpoint, &payload, created).await
        {
            results.push(ProbeResult::fail(&post_name, phase, hint));
            results.push(ProbeResult::skip(
                format!("GET {endpoint}/{{id}}"),
                phase,
                "Skipped — POST failed due to Content-Type rejection",
            ));
            return results;
        }
    }

    let header_view = header_view(&resp.headers);
    let (ok, errs) = validator.validate_resource(
        resp.json(),
        201,
        resp.status,
        &header_view,
        Some(resource_type),
    );
    results.extend(validation_results(&post_name, phase, ok, errs, ""));

    let created_body = resp.json().cloned().unwrap_or_default();

    let Some(resource_id) = resp
        .json()
        .and_then(|b| b.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        results.push(ProbeResult::skip(
            format!("GET {endpoint}/{{id}}"),
            phase,
            "No id returned from POST",
        ));
        return results;
    };
    created.push(CreatedResource {
        endpoint: endpoint.to_string(),
        id: resource_id.clone(),
    });

    // -- READ -----------------------------------------------------------
    let resource_path = format!("{endpoint}/{resource_id}");
    let get_name = format!("GET {endpoint}/{{id}}");
    let resp = match transport.get(&resource_path).await {
        Ok(resp) => resp,
        Err(e) => {
            results.push(ProbeResult::error(get_name, phase, e.to_string()));
            return results;
        }
    };
    let header_view = header_view(&resp.headers);
    let (ok, errs) = validator.validate_resource(
        resp.json(),
        200,
        resp.status,
        &header_view,
        Some(resource_type),
    );
    results.extend(validation_results(&get_name, phase, ok, errs, ""));

    // -- UPDATE (PUT) -----------------------------------------------------
    let new_display = format!("Updated-{}", &resource_id[..resource_id.len().min(8)]);
    let mut put_payload = created_body;
    if let Some(obj) = put_payload.as_object_mut() {
        obj.remove("meta");
        obj.insert(
            display_name_field.to_string(),
            Value::String(new_display.clone()),
        );
    }

    let put_name = format!("PUT {endpoint}/{{id}}");
    let resp = match transport.put(&resource_path, &put_payload).await {
        Ok(resp) => resp,
        Err(e) => {
            results.push(ProbeResult::error(put_name, phase, e.to_string()));
            return results;
        }
    };
    let header_view = header_view(&resp.headers);
    let (ok, errs) = validator.validate_resource(
        resp.json(),
        200,
        resp.status,
        &header_view,
        Some(resource_type),
    );
    results.extend(validation_results(&put_name, phase, ok, errs, ""));

    let verify_put_name = format!("GET {endpoint}/{{id}} after PUT");
    match transport.get(&resource_path).await {
        Ok(resp) => {
            let actual = resp.json().and_then(|b| b.get(display_name_field));
            if actual.and_then(Value::as_str) == Some(new_display.as_str()) {
                results.push(ProbeResult::pass_with(
                    verify_put_name,
                    phase,
                    format!("{display_name_field} update persisted"),
                ));
            } else {
                results.push(ProbeResult::fail(
                    verify_put_name,
                    phase,
                    format!(
                        "Expected {display_name_field}='{new_display}', got {:?}",
                        actual
                    ),
                ));
            }
        }
        Err(e) => results.push(ProbeResult::error(verify_put_name, phase, e.to_string())),
    }

    // -- PATCH (set active=false) -----------------------------------------
    let patch_payload = make_patch(vec![serde_json::json!({
        "op": "replace",
        "path": "active",
        "value": false,
    })]);
    let patch_name = format!("PATCH {endpoint}/{{id}}");
    let resp = match transport.patch(&resource_path, &patch_payload).await {
        Ok(resp) => resp,
        Err(e) => {
            results.push(ProbeResult::error(patch_name, phase, e.to_string()));
            return results;
        }
    };
    let header_view = header_view(&resp.headers);
    let (ok, errs) = validator.validate_resource(
        resp.json(),
        200,
        resp.status,
        &header_view,
        Some(resource_type),
    );
    results.extend(validation_results(&patch_name, phase, ok, errs, ""));

    let verify_patch_name = format!("GET {endpoint}/{{id}} after PATCH");
    match transport.get(&resource_path).await {
        Ok(resp) => {
            if resource_type == "Group" {
                if resp.status == 200 {
                    results.push(ProbeResult::pass_with(
                        verify_patch_name,
                        phase,
                        "200 OK confirmed",
                    ));
                } else {
                    results.push(ProbeResult::fail(
                        verify_patch_name,
                        phase,
                        format!("Expected 200, got {}", resp.status),
                    ));
                }
            } else {
                let active = resp.json().and_then(|b| b.get("active"));
                if active.and_then(Value::as_bool) == Some(false) {
                    results.push(ProbeResult::pass_with(
                        verify_patch_name,
                        phase,
                        "active=false confirmed",
                    ));
                } else {
                    results.push(ProbeResult::fail(
                        verify_patch_name,
                        phase,
                        format!("Expected active=false, got {:?}", active),
                    ));
                }
            }
        }
        Err(e) => results.push(ProbeResult::error(verify_patch_name, phase, e.to_string())),
    }

    // -- PATCH add/remove members (Group only) -----------------------------
    if resource_type == "Group" {
        let add_patch = make_patch(vec![serde_json::json!({
            "op": "add",
            "path": "members",
            "value": [{"value": "fake-member-id"}],
        })]);
        let add_name = format!("PATCH {endpoint}/{{id}} add member");
        match transport.patch(&resource_path, &add_patch).await {
            Ok(resp) if resp.status == 200 => results.push(ProbeResult::pass(add_name, phase)),
            Ok(resp) => results.push(ProbeResult::fail(
                add_name,
                phase,
                format!("Expected 200, got {}", resp.status),
            )),
            Err(e) => results.push(ProbeResult::error(add_name, phase, e.to_string())),
        }

        let rm_patch = make_patch(vec![serde_json::json!({
            "op": "remove",
            "path": "members",
        })]);
        let rm_name = format!("PATCH {endpoint}/{{id}} remove members");
        match transport.patch(&resource_path, &rm_patch).await {
            Ok(resp) if resp.status == 200 => results.push(ProbeResult::pass(rm_name, phase)),
            Ok(resp) => results.push(ProbeResult::fail(
                rm_name,
                phase,
                format!("Expected 200, got {}", resp.status),
            )),
            Err(e) => results.push(ProbeResult::error(rm_name, phase, e.to_string())),
        }
    }

    // -- DELETE -------------------------------------------------------------
    let delete_name = format!("DELETE {endpoint}/{{id}}");
    let resp = match transport.delete(&resource_path).await {
        Ok(resp) => resp,
        Err(e) => {
            results.push(ProbeResult::error(delete_name, phase, e.to_string()));
            return results;
        }
    };
    let (ok, errs) = validator.validate_delete(resp.status, resp.body_text().unwrap_or(""));
    results.extend(validation_results(
        &delete_name,
        phase,
        ok,
        errs,
        "204 No Content",
    ));
    if ok {
        created.retain(|r| r.id != resource_id);
    }

    let verify_delete_name = format!("GET {endpoint}/{{id}} after DELETE (expect 404)");
    match transport.get(&resource_path).await {
        Ok(resp) if resp.status == 404 => results.push(ProbeResult::pass_with(
            verify_delete_name,
            phase,
            "404 confirmed — resource no longer exists",
        )),
        Ok(resp) => results.push(ProbeResult::fail(
            verify_delete_name,
            phase,
            format!("Expected 404, got {}", resp.status),
        )),
        Err(e) => results.push(ProbeResult::error(verify_delete_name, phase, e.to_string())),
    }

    results
}
