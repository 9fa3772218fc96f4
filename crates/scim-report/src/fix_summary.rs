//! Groups FAIL/ERROR results into a small number of likely root causes.
//!
//! There is no precedent for this in the original tool's simpler
//! phase-grouped report: this is new synthesis, not a port. The pattern
//! table below is deliberately small and conservative — it recognises the
//! handful of failure shapes the response validator and probe are known to
//! produce, and anything it doesn't recognise rolls into a catch-all so the
//! summary never claims more insight than it has.

use crate::{ProbeResult, Status};
use serde::Serialize;

enum Matcher {
    MessageContains(&'static str),
    PhasePrefix(&'static str),
}

struct FixPattern {
    priority: u32,
    title: &'static str,
    matcher: Matcher,
    rationale: &'static str,
    fix: &'static str,
}

/// One root-cause grouping in a rendered fix summary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FixSummaryEntry {
    /// Lower priority number sorts first — the most actionable causes lead.
    pub priority: u32,
    /// Short name of the root cause.
    pub title: String,
    /// Number of FAIL/ERROR results this grouping accounts for.
    pub count: usize,
    /// Why this matters.
    pub rationale: String,
    /// What to do about it.
    pub fix: String,
}

const PATTERNS: &[FixPattern] = &[
    FixPattern {
        priority: 1,
        title: "Server does not send application/scim+json",
        matcher: Matcher::MessageContains("application/scim+json"),
        rationale: "RFC 7644 §8.2 requires both requests and responses to use the \
            application/scim+json media type; many clients treat application/json \
            as non-conformant.",
        fix: "Set Content-Type: application/scim+json on every SCIM response.",
    },
    FixPattern {
        priority: 2,
        title: "Responses omit required 'meta'",
        matcher: Matcher::MessageContains("'meta'"),
        rationale: "RFC 7643 §3.1 requires every resource response to carry a meta \
            attribute with resourceType, created, and lastModified.",
        fix: "Populate meta.{resourceType,created,lastModified} on every resource response.",
    },
    FixPattern {
        priority: 3,
        title: "writeOnly attributes echoed back to the client",
        matcher: Matcher::MessageContains("writeOnly attribute"),
        rationale: "RFC 7643 §7 forbids returning attributes marked returned: never \
            (e.g. password) in any response.",
        fix: "Strip writeOnly attributes from the serialized resource before responding.",
    },
    FixPattern {
        priority: 4,
        title: "Responses omit required 'id'",
        matcher: Matcher::MessageContains("'id'"),
        rationale: "RFC 7643 §3.1 requires the server to assign and return an id on \
            every resource response.",
        fix: "Assign a stable id at creation time and include it in every response.",
    },
    FixPattern {
        priority: 5,
        title: "ETag header does not match meta.version",
        matcher: Matcher::MessageContains("does not match meta.version"),
        rationale: "RFC 7644 §3.14 expects the ETag header to mirror meta.version so \
            clients can use conditional requests.",
        fix: "Derive the ETag header from the same value stored in meta.version.",
    },
    FixPattern {
        priority: 6,
        title: "201 Created responses omit the Location header",
        matcher: Matcher::MessageContains("Location header should be present"),
        rationale: "RFC 7644 §3.3 requires a Location header pointing at the new \
            resource on 201 Created.",
        fix: "Set Location to meta.location on every 201 Created response.",
    },
    FixPattern {
        priority: 7,
        title: "Error responses are missing required fields",
        matcher: Matcher::MessageContains("Error response"),
        rationale: "RFC 7644 §3.12 requires error bodies to carry the Error schema URN \
            and a status field.",
        fix: "Populate schemas and status on every SCIM error response.",
    },
    FixPattern {
        priority: 8,
        title: "Server rejects application/scim+json requests",
        matcher: Matcher::MessageContains("server MUST accept"),
        rationale: "RFC 7644 §8.2 requires servers to accept the application/scim+json \
            media type clients are required to send.",
        fix: "Accept application/scim+json (not only application/json) as a request Content-Type.",
    },
    FixPattern {
        priority: 9,
        title: "Cleanup could not remove every test resource",
        matcher: Matcher::PhasePrefix("Cleanup"),
        rationale: "A resource created during the probe could not be deleted afterward, \
            which leaves test data behind on the target server.",
        fix: "Check DELETE handling for the endpoint named in the failing result.",
    },
];

/// Derive a prioritised fix summary from a completed probe run.
///
/// Each pattern is checked in priority order; a result counts toward at
/// most one pattern (first match wins), so the same failure never inflates
/// two buckets. FAIL/ERROR results matching no pattern are rolled into a
/// trailing "Unclassified failures" entry. Only entries with at least one
/// match are returned.
pub fn fix_summary(results: &[ProbeResult]) -> Vec<FixSummaryEntry> {
    let mut claimed = vec![false; results.len()];
    let mut entries = Vec::new();

    for pattern in PATTERNS {
        let count = results
            .iter()
            .enumerate()
            .filter(|(idx, r)| {
                !claimed[*idx] && is_failure(r) && matches(pattern, r)
            })
            .count();
        if count == 0 {
            continue;
        }
        for (idx, r) in results.iter().enumerate() {
            if !claimed[idx] && is_failure(r) && matches(pattern, r) {
                claimed[idx] = true;
            }
        }
        entries.push(FixSummaryEntry {
            priority: pattern.priority,
            title: pattern.title.to_string(),
            count,
            rationale: pattern.rationale.to_string(),
            fix: pattern.fix.to_string(),
        });
    }

    let unclassified = results
        .iter()
        .enumerate()
        .filter(|(idx, r)| !claimed[*idx] && is_failure(r))
        .count();
    if unclassified > 0 {
        entries.push(FixSummaryEntry {
            priority: PATTERNS.len() as u32 + 1,
            title: "Unclassified failures".to_string(),
            count: unclassified,
            rationale: "These failures did not match any known root-cause pattern.".to_string(),
            fix: "Review the individual result messages above for details.".to_string(),
        });
    }

    entries.sort_by_key(|e| e.priority);
    entries
}

fn is_failure(result: &ProbeResult) -> bool {
    matches!(result.status, Status::Fail | Status::Error)
}

fn matches(pattern: &FixPattern, result: &ProbeResult) -> bool {
    match pattern.matcher {
        Matcher::MessageContains(substr) => result.message.contains(substr),
        Matcher::PhasePrefix(prefix) => result.phase.starts_with(prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_failures_means_no_fix_summary() {
        let results = vec![ProbeResult::pass("a", "Phase 1")];
        assert!(fix_summary(&results).is_empty());
    }

    #[test]
    fn matched_pattern_reports_count_and_priority() {
        let results = vec![ProbeResult::fail(
            "GET /Users/x",
            "Phase 2",
            "Server response missing required attribute 'meta'",
        )];
        let summary = fix_summary(&results);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].title, "Responses omit required 'meta'");
        assert_eq!(summary[0].count, 1);
    }

    #[test]
    fn each_failure_counts_toward_at_most_one_pattern() {
        let results = vec![ProbeResult::fail(
            "GET /Users/x",
            "Phase 2",
            "Server response missing required attribute 'meta' and 'id'",
        )];
        let summary = fix_summary(&results);
        let total_counted: usize = summary.iter().map(|e| e.count).sum();
        assert_eq!(total_counted, 1);
    }

    #[test]
    fn unmatched_failure_is_unclassified() {
        let results = vec![ProbeResult::fail("GET /x", "Phase 9", "something unexpected")];
        let summary = fix_summary(&results);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].title, "Unclassified failures");
    }

    #[test]
    fn entries_are_sorted_by_priority() {
        let results = vec![
            ProbeResult::fail("a", "Phase 1", "Error response missing status"),
            ProbeResult::fail("b", "Phase 1", "got application/scim+json mismatch"),
        ];
        let summary = fix_summary(&results);
        assert!(summary.windows(2).all(|w| w[0].priority <= w[1].priority));
    }
}
