use scim_report::ProbeResult;
use scim_validate::response::{Severity, ServerValidationError};

/// Split a `(ok, errors)` validation outcome into `ProbeResult`s: one
/// PASS/FAIL for the check itself, plus a separate WARN result for every
/// warning-severity finding so compat-mode deviations never get folded
/// into (or hidden behind) the pass/fail verdict.
pub(crate) fn validation_results(
    name: &str,
    phase: &str,
    ok: bool,
    errors: Vec<ServerValidationError>,
    pass_message: &str,
) -> Vec<ProbeResult> {
    let mut results = Vec::new();
    let fails: Vec<&ServerValidationError> = errors
        .iter()
        .filter(|e| e.severity != Severity::Warn)
        .collect();
    let warns: Vec<&ServerValidationError> =
        errors.iter().filter(|e| e.severity == Severity::Warn).collect();

    if ok && fails.is_empty() {
        results.push(ProbeResult::pass_with(name, phase, pass_message));
    } else {
        let message = if !fails.is_empty() {
            fails.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
        } else {
            errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
        };
        results.push(ProbeResult::fail(name, phase, message));
    }

    for w in warns {
        results.push(ProbeResult::warn(name, phase, w.to_string()));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_with_no_fails_is_a_pass() {
        let results = validation_results("GET /Users", "Phase 1", true, vec![], "200 OK");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "200 OK");
    }

    #[test]
    fn fail_severity_error_produces_one_fail_result() {
        let errors = vec![ServerValidationError {
            message: "missing id".to_string(),
            path: String::new(),
            severity: Severity::Fail,
        }];
        let results = validation_results("GET /Users", "Phase 1", false, errors, "");
        assert_eq!(results.len(), 1);
        assert!(results[0].message.contains("missing id"));
    }

    #[test]
    fn warn_severity_error_produces_pass_plus_warn() {
        let errors = vec![ServerValidationError {
            message: "Content-Type should be application/scim+json".to_string(),
            path: String::new(),
            severity: Severity::Warn,
        }];
        let results = validation_results("GET /Users", "Phase 1", true, errors, "");
        assert_eq!(results.len(), 2);
        assert!(results[1].message.contains("Content-Type"));
    }
}
