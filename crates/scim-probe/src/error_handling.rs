//! Phase 7 — SCIM error-response conformance.

use scim_report::ProbeResult;
use scim_transport::HttpTransport;
use scim_validate::response::ResponseValidator;
use serde_json::json;

use crate::helpers::validation_results;

const PHASE: &str = "Phase 7 — Error Handling";

/// GET a nonexistent resource (expect 404), POST a non-SCIM body (expect
/// 400), and POST a User missing its required `userName` (expect 400) —
/// every case checked against the SCIM Error schema (RFC 7644 §3.12).
pub async fn test_error_handling(
    transport: &dyn HttpTransport,
    validator: &ResponseValidator,
) -> Vec<ProbeResult> {
    let mut results = Vec::new();

    match transport.get("/Users/nonexistent-id-000000").await {
        Ok(resp) => {
            let (ok, errs) = validator.validate_error(resp.json(), 404, resp.status);
            results.extend(validation_results(
                "GET /Users/nonexistent (expect 404)",
                PHASE,
                ok,
                errs,
                "",
            ));
        }
        Err(e) => results.push(ProbeResult::error(
            "GET /Users/nonexistent (expect 404)",
            PHASE,
            e.to_string(),
        )),
    }

    match transport
        .post("/Users", &json!({"not": "a scim resource"}), None)
        .await
    {
        Ok(resp) => {
            let (ok, errs) = validator.validate_error(resp.json(), 400, resp.status);
            results.extend(validation_results(
                "POST /Users invalid body (expect 400)",
                PHASE,
                ok,
                errs,
                "",
            ));
        }
        Err(e) => results.push(ProbeResult::error(
            "POST /Users invalid body (expect 400)",
            PHASE,
            e.to_string(),
        )),
    }

    let missing_username = json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
    });
    match transport.post("/Users", &missing_username, None).await {
        Ok(resp) => {
            let (ok, errs) = validator.validate_error(resp.json(), 400, resp.status);
            results.extend(validation_results(
                "POST /Users missing userName (expect 400)",
                PHASE,
                ok,
                errs,
                "",
            ));
        }
        Err(e) => results.push(ProbeResult::error(
            "POST /Users missing userName (expect 400)",
            PHASE,
            e.to_string(),
        )),
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTransport;
    use scim_transport::{Headers, HttpResponse};

    fn error_body(status: u16) -> String {
        format!(
            r#"{{"schemas":["urn:ietf:params:scim:api:messages:2.0:Error"],"status":"{status}"}}"#
        )
    }

    #[tokio::test]
    async fn all_three_cases_pass_with_conformant_errors() {
        let transport = MockTransport::new();
        transport.stub_get(
            "/Users/nonexistent-id-000000",
            HttpResponse::new(404, Headers::new(), Some(error_body(404))),
        );
        transport.stub_post(
            "/Users",
            HttpResponse::new(400, Headers::new(), Some(error_body(400))),
        );
        transport.stub_post(
            "/Users",
            HttpResponse::new(400, Headers::new(), Some(error_body(400))),
        );

        let results = test_error_handling(&transport, &ResponseValidator::strict()).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == scim_report::Status::Pass));
    }

    #[tokio::test]
    async fn wrong_status_is_a_fail() {
        let transport = MockTransport::new();
        transport.stub_get(
            "/Users/nonexistent-id-000000",
            HttpResponse::new(200, Headers::new(), Some("{}".to_string())),
        );
        transport.stub_post(
            "/Users",
            HttpResponse::new(400, Headers::new(), Some(error_body(400))),
        );
        transport.stub_post(
            "/Users",
            HttpResponse::new(400, Headers::new(), Some(error_body(400))),
        );

        let results = test_error_handling(&transport, &ResponseValidator::strict()).await;
        assert_eq!(results[0].status, scim_report::Status::Fail);
    }
}
