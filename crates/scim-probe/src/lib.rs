//! Drives a live SCIM server through the 7-phase conformance sequence of
//! `spec.md` §4.6: discovery, per-resource-type CRUD lifecycles, a rapid
//! create/delete loop, search, and error-handling probes, then cleans up
//! every resource it created.
//!
//! [`run_probe`] is the single entry point. It never panics and never lets
//! a transport failure abort the run early — each step converts its own
//! failure into a [`ProbeResult`] and the orchestrator moves on, matching
//! `probe/runner.py::ProbeRunner.run`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod discovery;
mod error_handling;
mod helpers;
mod lifecycle;
mod search;
#[cfg(test)]
mod test_support;

pub use lifecycle::CreatedResource;

use scim_factory::{make_agent, make_agentic_application, make_group, make_user};
use scim_report::ProbeResult;
use scim_transport::HttpTransport;
use scim_validate::response::ResponseValidator;
use tracing::{info, warn};

/// Upper bound on how many agents Phase 5a creates and deletes in
/// succession (`spec.md` §4.6: "N capped at 10").
const RAPID_LIFECYCLE_COUNT: usize = 10;

/// Options controlling a probe run, one field per `probe` CLI flag in
/// `spec.md` §6.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// `--strict` (default) vs. `--compat`: governs response-validator
    /// severity for known real-world deviations.
    pub strict: bool,
    /// `--skip-cleanup`: leave created resources on the server afterwards.
    pub skip_cleanup: bool,
    /// `--resource <Type>`: narrow phases 2-5 to a single resource type.
    /// `None` runs every type the server advertises support for.
    pub resource: Option<String>,
    /// `--i-accept-side-effects`: mandatory consent gate. `run_probe`
    /// refuses to issue any request unless this is `true`.
    pub accept_side_effects: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            strict: true,
            skip_cleanup: false,
            resource: None,
            accept_side_effects: false,
        }
    }
}

fn resource_requested(options: &ProbeOptions, name: &str) -> bool {
    match &options.resource {
        Some(only) => only.eq_ignore_ascii_case(name),
        None => true,
    }
}

/// Run the full conformance probe against `transport` and return every
/// [`ProbeResult`] produced, in phase order. The caller derives an exit
/// code from `scim_report::Summary::from_results(&results).is_success()`.
///
/// Refuses to issue any request — returning a single FAIL result instead —
/// unless `options.accept_side_effects` is `true` (`spec.md` §4.6 Safety
/// gate). `base_url` is used only for that refusal message and for
/// tracing spans; `transport` already carries it.
pub async fn run_probe(
    transport: &dyn HttpTransport,
    base_url: &str,
    options: &ProbeOptions,
) -> Vec<ProbeResult> {
    if !options.accept_side_effects {
        warn!(
            target: "scim.probe",
            base_url,
            prefix = scim_factory::TEST_RESOURCE_PREFIX,
            "refusing to run probe without --i-accept-side-effects"
        );
        return vec![ProbeResult::fail(
            "Safety gate",
            "Phase 0 — Refusal",
            format!(
                "Refusing to run side-effecting probe against {base_url} without \
                 --i-accept-side-effects. This would create and delete resources \
                 prefixed '{}' on that server.",
                scim_factory::TEST_RESOURCE_PREFIX
            ),
        )];
    }

    info!(target: "scim.probe", base_url, strict = options.strict, "starting probe run");

    let mut results = Vec::new();
    let validator = if options.strict {
        ResponseValidator::strict()
    } else {
        ResponseValidator::compat()
    };
    let mut created: Vec<CreatedResource> = Vec::new();

    // Phase 1 — Discovery.
    results.extend(discovery::test_discovery(transport, options.strict).await);
    let supported = discovery::discover_supported_resources(transport).await;

    // Phase 2 — User CRUD Lifecycle.
    if resource_requested(options, "User") {
        results.extend(
            lifecycle::crud_lifecycle(
                transport,
                &validator,
                "User",
                "/Users",
                make_user(None),
                "Phase 2 — User CRUD Lifecycle",
                &mut created,
                "displayName",
            )
            .await,
        );
    }

    // Phase 3 — Group CRUD Lifecycle.
    if resource_requested(options, "Group") {
        results.extend(
            lifecycle::crud_lifecycle(
                transport,
                &validator,
                "Group",
                "/Groups",
                make_group(None, None),
                "Phase 3 — Group CRUD Lifecycle",
                &mut created,
                "displayName",
            )
            .await,
        );
    }

    // Phase 4 — Agent CRUD Lifecycle (only if advertised).
    if resource_requested(options, "Agent") {
        if supported.contains("Agent") {
            results.extend(
                lifecycle::crud_lifecycle(
                    transport,
                    &validator,
                    "Agent",
                    "/Agents",
                    make_agent(None),
                    "Phase 4 — Agent CRUD Lifecycle",
                    &mut created,
                    "displayName",
                )
                .await,
            );
        } else {
            results.push(ProbeResult::skip(
                "Agent CRUD Lifecycle",
                "Phase 4 — Agent CRUD Lifecycle",
                "Server does not advertise Agent in /ResourceTypes",
            ));
        }
    }

    // Phase 5 — AgenticApplication CRUD Lifecycle (only if advertised).
    if resource_requested(options, "AgenticApplication") {
        if supported.contains("AgenticApplication") {
            results.extend(
                lifecycle::crud_lifecycle(
                    transport,
                    &validator,
                    "AgenticApplication",
                    "/AgenticApplications",
                    make_agentic_application(None),
                    "Phase 5 — AgenticApplication CRUD Lifecycle",
                    &mut created,
                    "displayName",
                )
                .await,
            );
        } else {
            results.push(ProbeResult::skip(
                "AgenticApplication CRUD Lifecycle",
                "Phase 5 — AgenticApplication CRUD Lifecycle",
                "Server does not advertise AgenticApplication in /ResourceTypes",
            ));
        }
    }

    // Phase 5a — Agent Rapid Lifecycle.
    if resource_requested(options, "Agent") {
        if supported.contains("Agent") {
            results.push(rapid_agent_lifecycle(transport).await);
        } else {
            results.push(ProbeResult::skip(
                "Agent Rapid Lifecycle",
                "Phase 5a — Agent Rapid Lifecycle",
                "Server does not advertise Agent in /ResourceTypes",
            ));
        }
    }

    // Phase 6 — Search.
    results.extend(search::test_search(transport, &validator).await);

    // Phase 7 — Error Handling.
    results.extend(error_handling::test_error_handling(transport, &validator).await);

    // Cleanup — reverse-order DELETE of everything still tracked.
    if options.skip_cleanup {
        if !created.is_empty() {
            results.push(ProbeResult::skip(
                "Cleanup",
                "Cleanup",
                format!("--skip-cleanup: {} resource(s) left on server", created.len()),
            ));
        }
    } else {
        results.extend(cleanup(transport, created).await);
    }

    info!(
        target: "scim.probe",
        total = results.len(),
        "probe run complete"
    );
    results
}

/// Phase 5a: create then immediately delete `RAPID_LIFECYCLE_COUNT` agents
/// in sequence, to surface server-side race windows around rapid
/// create/delete churn. Emits a single aggregate result.
async fn rapid_agent_lifecycle(transport: &dyn HttpTransport) -> ProbeResult {
    const PHASE: &str = "Phase 5a — Agent Rapid Lifecycle";
    let mut failures = Vec::new();

    for i in 0..RAPID_LIFECYCLE_COUNT {
        let payload = make_agent(None);
        let post = match transport.post("/Agents", &payload, None).await {
            Ok(resp) => resp,
            Err(e) => {
                failures.push(format!("create #{i}: {e}"));
                continue;
            }
        };
        if post.status != 201 && post.status != 200 {
            failures.push(format!("create #{i}: expected 201, got {}", post.status));
            continue;
        }
        let Some(id) = post
            .json()
            .and_then(|b| b.get("id"))
            .and_then(serde_json::Value::as_str)
        else {
            failures.push(format!("create #{i}: no id in response"));
            continue;
        };
        match transport.delete(&format!("/Agents/{id}")).await {
            Ok(resp) if resp.status == 204 => {}
            Ok(resp) => failures.push(format!("delete #{i}: expected 204, got {}", resp.status)),
            Err(e) => failures.push(format!("delete #{i}: {e}")),
        }
    }

    if failures.is_empty() {
        ProbeResult::pass_with(
            "Agent Rapid Lifecycle",
            PHASE,
            format!("{RAPID_LIFECYCLE_COUNT} agents created and deleted in succession"),
        )
    } else {
        ProbeResult::fail("Agent Rapid Lifecycle", PHASE, failures.join("; "))
    }
}

/// Drain `created` in reverse order, DELETE-ing each and recording its own
/// PASS/FAIL result (`spec.md` §4.6 Cleanup / §9 "Cleanup via a stack").
async fn cleanup(transport: &dyn HttpTransport, created: Vec<CreatedResource>) -> Vec<ProbeResult> {
    const PHASE: &str = "Cleanup";
    let mut results = Vec::new();

    for resource in created.into_iter().rev() {
        let path = format!("{}/{}", resource.endpoint, resource.id);
        let name = format!("DELETE {path} (cleanup)");
        match transport.delete(&path).await {
            Ok(resp) if resp.status == 204 || resp.status == 404 => {
                results.push(ProbeResult::pass(name, PHASE));
            }
            Ok(resp) => results.push(ProbeResult::fail(
                name,
                PHASE,
                format!("Expected 204, got {}", resp.status),
            )),
            Err(e) => results.push(ProbeResult::error(name, PHASE, e.to_string())),
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTransport;
    use scim_transport::{Headers, HttpResponse};

    fn scim_json_headers() -> Headers {
        let mut h = Headers::new();
        h.insert("Content-Type", "application/scim+json");
        h
    }

    #[tokio::test]
    async fn refuses_without_accept_side_effects() {
        let transport = MockTransport::new();
        let options = ProbeOptions::default();
        let results = run_probe(&transport, "https://example.com", &options).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, scim_report::Status::Fail);
        assert!(results[0].message.contains("i-accept-side-effects"));
        assert!(transport.calls().is_empty(), "no request should be issued");
    }

    #[tokio::test]
    async fn resource_filter_narrows_to_single_lifecycle() {
        let transport = MockTransport::new();
        // Discovery
        for path in ["/ServiceProviderConfig", "/Schemas", "/ResourceTypes"] {
            transport.stub_get(
                path,
                HttpResponse::new(200, scim_json_headers(), Some("{}".to_string())),
            );
        }
        let options = ProbeOptions {
            strict: true,
            skip_cleanup: true,
            resource: Some("Agent".to_string()),
            accept_side_effects: true,
        };
        let results = run_probe(&transport, "https://example.com", &options).await;
        // No User/Group lifecycle results should appear.
        assert!(!results
            .iter()
            .any(|r| r.phase.contains("User CRUD") || r.phase.contains("Group CRUD")));
        // Agent is unsupported by an empty discovery response, so both the
        // lifecycle and the rapid phase should SKIP.
        assert!(results
            .iter()
            .any(|r| r.phase.contains("Agent CRUD") && r.status == scim_report::Status::Skip));
        assert!(results
            .iter()
            .any(|r| r.phase.contains("Agent Rapid") && r.status == scim_report::Status::Skip));
    }

    #[tokio::test]
    async fn skip_cleanup_leaves_created_resources_and_records_a_skip() {
        let transport = MockTransport::new();
        for path in ["/ServiceProviderConfig", "/Schemas", "/ResourceTypes"] {
            transport.stub_get(
                path,
                HttpResponse::new(200, scim_json_headers(), Some("{}".to_string())),
            );
        }
        transport.stub_post(
            "/Users",
            HttpResponse::new(
                201,
                scim_json_headers(),
                Some(
                    r#"{"schemas":["urn:ietf:params:scim:schemas:core:2.0:User"],"id":"u1",
                    "userName":"scim-sanity-test-x","meta":{"resourceType":"User",
                    "created":"2026-01-01T00:00:00Z","lastModified":"2026-01-01T00:00:00Z"}}"#
                        .to_string(),
                ),
            ),
        );
        let options = ProbeOptions {
            strict: false,
            skip_cleanup: true,
            resource: Some("User".to_string()),
            accept_side_effects: true,
        };
        let results = run_probe(&transport, "https://example.com", &options).await;
        assert!(results
            .iter()
            .any(|r| r.phase == "Cleanup" && r.status == scim_report::Status::Skip));
        assert!(!transport.calls().iter().any(|(m, _)| *m == "DELETE"));
    }
}
