//! Groups probe outcomes by phase and renders them as terminal or JSON
//! output.
//!
//! [`ProbeResult`] is the unit this crate consumes — produced by
//! `scim-probe`, one per test step. [`render_terminal`] groups them under
//! phase headers with a colourised status tag (colour gated on the
//! caller-supplied `color` flag, so callers decide based on
//! `std::io::IsTerminal` rather than this crate guessing). [`render_json`]
//! emits the same data as a structured document plus a prioritised
//! [`FixSummary`] derived from a static pattern table.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fix_summary;
mod terminal;

pub use fix_summary::{fix_summary, FixSummaryEntry};

use serde::Serialize;

/// Outcome of a single conformance test step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The check succeeded.
    Pass,
    /// The check found a spec violation.
    Fail,
    /// The check found a tolerated deviation.
    Warn,
    /// The check did not run (out of scope, or not supported by the server).
    Skip,
    /// No response was produced at all (transport-layer failure).
    Error,
}

impl Status {
    /// Short upper-case label used in terminal output (`"PASS"`, `"ERR "`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warn => "WARN",
            Self::Skip => "SKIP",
            Self::Error => "ERR ",
        }
    }
}

/// A single conformance test result.
///
/// Renamed from the Python original's `TestResult` to `ProbeResult` to
/// avoid pytest's `Test*` collection pattern — kept here since it is now
/// simply the right name for what this is.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// Human-readable test name, e.g. `POST /Users`.
    pub name: String,
    /// Outcome of the test.
    pub status: Status,
    /// Optional detail about the outcome. Empty when there's nothing to add.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Optional extended detail, not shown in terminal output.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// Phase label for grouping in output, e.g. `Phase 2 — User CRUD Lifecycle`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phase: String,
}

impl ProbeResult {
    /// Construct a result with every field set explicitly.
    pub fn new(
        name: impl Into<String>,
        status: Status,
        message: impl Into<String>,
        phase: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            details: String::new(),
            phase: phase.into(),
        }
    }

    /// A passing result, with an optional note.
    pub fn pass(name: impl Into<String>, phase: impl Into<String>) -> Self {
        Self::new(name, Status::Pass, "", phase)
    }

    /// A passing result with a message clarifying what was verified.
    pub fn pass_with(
        name: impl Into<String>,
        phase: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(name, Status::Pass, message, phase)
    }

    /// A failing result.
    pub fn fail(
        name: impl Into<String>,
        phase: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(name, Status::Fail, message, phase)
    }

    /// A tolerated-deviation result.
    pub fn warn(
        name: impl Into<String>,
        phase: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(name, Status::Warn, message, phase)
    }

    /// A result for a step that did not run.
    pub fn skip(
        name: impl Into<String>,
        phase: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(name, Status::Skip, message, phase)
    }

    /// A result for a step that produced no response at all.
    pub fn error(
        name: impl Into<String>,
        phase: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(name, Status::Error, message, phase)
    }

    /// Extended detail, included in JSON but never shown in terminal output.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// Counts of results by status, used in both output modes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Summary {
    /// Total number of results.
    pub total: usize,
    /// Number of `Status::Pass` results.
    pub passed: usize,
    /// Number of `Status::Fail` results.
    pub failed: usize,
    /// Number of `Status::Warn` results.
    pub warnings: usize,
    /// Number of `Status::Skip` results.
    pub skipped: usize,
    /// Number of `Status::Error` results.
    pub errors: usize,
}

impl Summary {
    /// Tally a slice of results.
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.status {
                Status::Pass => summary.passed += 1,
                Status::Fail => summary.failed += 1,
                Status::Warn => summary.warnings += 1,
                Status::Skip => summary.skipped += 1,
                Status::Error => summary.errors += 1,
            }
        }
        summary
    }

    /// `true` iff no FAIL or ERROR results were recorded. WARN and SKIP
    /// never fail a run.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

pub use terminal::render_terminal;

/// The JSON report document (`spec.md` §4.8).
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Crate version of the tool that produced this report.
    pub scim_sanity_version: &'a str,
    /// `"strict"` or `"compat"`.
    pub mode: &'a str,
    /// Wall-clock time the run completed, `YYYY-MM-DD HH:MM:SS` local time.
    pub timestamp: String,
    /// Pass/fail/warn/skip/error tallies.
    pub summary: Summary,
    /// Prioritised root-cause groupings of the failures present.
    pub issues: Vec<FixSummaryEntry>,
    /// Every individual result, in run order.
    pub results: &'a [ProbeResult],
}

/// Render the full JSON report.
pub fn render_json<'a>(
    results: &'a [ProbeResult],
    mode: &'a str,
    version: &'a str,
    timestamp: impl Into<String>,
) -> JsonReport<'a> {
    JsonReport {
        scim_sanity_version: version,
        mode,
        timestamp: timestamp.into(),
        summary: Summary::from_results(results),
        issues: fix_summary(results),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tallies_every_status() {
        let results = vec![
            ProbeResult::pass("a", "Phase 1"),
            ProbeResult::fail("b", "Phase 1", "oops"),
            ProbeResult::warn("c", "Phase 1", "careful"),
            ProbeResult::skip("d", "Phase 1", "n/a"),
            ProbeResult::error("e", "Phase 1", "boom"),
        ];
        let summary = Summary::from_results(&results);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn warn_and_skip_never_fail_a_run() {
        let results = vec![
            ProbeResult::pass("a", "Phase 1"),
            ProbeResult::warn("b", "Phase 1", "careful"),
            ProbeResult::skip("c", "Phase 1", "n/a"),
        ];
        assert!(Summary::from_results(&results).is_success());
    }

    #[test]
    fn fail_or_error_drives_run_to_failure() {
        let failing = vec![ProbeResult::fail("a", "Phase 1", "oops")];
        assert!(!Summary::from_results(&failing).is_success());
        let erroring = vec![ProbeResult::error("a", "Phase 1", "boom")];
        assert!(!Summary::from_results(&erroring).is_success());
    }

    #[test]
    fn json_report_serializes_expected_shape() {
        let results = vec![ProbeResult::pass("GET /Users", "Phase 1 — Discovery")];
        let report = render_json(&results, "strict", "0.1.0", "2026-01-01 00:00:00");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["mode"], "strict");
        assert_eq!(value["summary"]["total"], 1);
        assert!(value["results"].is_array());
    }
}
