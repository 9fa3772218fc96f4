//! Renders probe results as phase-grouped, optionally colourised terminal
//! text.
//!
//! Mirrors `probe/report.py::_print_terminal`, with colour gated on a
//! caller-supplied flag instead of this crate guessing `isatty()` itself —
//! the CLI boundary is the one place that knows whether stdout is a
//! terminal.

use crate::{fix_summary, FixSummaryEntry, ProbeResult, Status, Summary};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const CYAN: &str = "\x1b[96m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

fn colorize(color: bool, code: &str, text: &str) -> String {
    if color {
        format!("{code}{text}{RESET}")
    } else {
        text.to_string()
    }
}

fn status_color(status: Status) -> &'static str {
    match status {
        Status::Pass => GREEN,
        Status::Fail | Status::Error => RED,
        Status::Warn | Status::Skip => YELLOW,
    }
}

/// Render the full terminal report: header, phase-grouped results, summary
/// footer, fix summary, and a one-line verdict.
///
/// Colour escapes are emitted only when `color` is `true`; callers decide
/// that based on `std::io::IsTerminal` (or an explicit `--no-color` flag).
pub fn render_terminal(results: &[ProbeResult], color: bool) -> String {
    let mut out = String::new();
    let summary = Summary::from_results(results);

    out.push('\n');
    out.push_str(&colorize(color, BOLD, "SCIM Server Conformance Probe"));
    out.push('\n');
    out.push_str(&colorize(color, DIM, &"=".repeat(50)));
    out.push('\n');

    let mut current_phase = "";
    for result in results {
        if !result.phase.is_empty() && result.phase != current_phase {
            current_phase = &result.phase;
            out.push('\n');
            out.push_str(&colorize(color, CYAN, &format!("  {current_phase}")));
            out.push('\n');
            out.push_str(&colorize(color, DIM, &format!("  {}", "-".repeat(40))));
            out.push('\n');
        }

        let label = colorize(color, status_color(result.status), result.status.label());
        out.push_str(&format!("  [{label}] {}\n", result.name));
        if !result.message.is_empty() {
            out.push_str(&format!(
                "         {}\n",
                colorize(color, DIM, &result.message)
            ));
        }
    }

    out.push('\n');
    out.push_str(&colorize(color, DIM, &"=".repeat(50)));
    out.push('\n');
    out.push_str(&format!("  {}\n", summary_line(&summary, color)));
    out.push('\n');

    let issues = fix_summary(results);
    if !issues.is_empty() {
        out.push_str(&render_fix_summary(&issues, color));
    }

    out.push_str(&format!("{}\n", verdict_line(&summary, &issues)));
    out
}

fn summary_line(summary: &Summary, color: bool) -> String {
    let mut parts = Vec::new();
    if summary.passed > 0 {
        parts.push(colorize(color, GREEN, &format!("{} passed", summary.passed)));
    }
    if summary.failed > 0 {
        parts.push(colorize(color, RED, &format!("{} failed", summary.failed)));
    }
    if summary.errors > 0 {
        parts.push(colorize(color, RED, &format!("{} errors", summary.errors)));
    }
    if summary.warnings > 0 {
        parts.push(colorize(
            color,
            YELLOW,
            &format!("{} warnings", summary.warnings),
        ));
    }
    if summary.skipped > 0 {
        parts.push(colorize(
            color,
            YELLOW,
            &format!("{} skipped", summary.skipped),
        ));
    }
    parts.push(format!("{} total", summary.total));
    parts.join(", ")
}

fn render_fix_summary(issues: &[FixSummaryEntry], color: bool) -> String {
    let mut out = String::new();
    out.push_str(&colorize(color, BOLD, "Fix Summary"));
    out.push('\n');
    out.push_str(&colorize(color, DIM, &"-".repeat(50)));
    out.push('\n');
    for issue in issues {
        out.push_str(&format!(
            "  {}. {} ({} result{})\n",
            issue.priority,
            issue.title,
            issue.count,
            if issue.count == 1 { "" } else { "s" }
        ));
        out.push_str(&format!(
            "     {}\n",
            colorize(color, DIM, &issue.rationale)
        ));
        out.push_str(&format!("     Fix: {}\n", issue.fix));
    }
    out.push('\n');
    out
}

fn verdict_line(summary: &Summary, issues: &[FixSummaryEntry]) -> String {
    if summary.is_success() {
        return "All checks passed.".to_string();
    }
    match issues.first() {
        Some(top) if top.title != "Unclassified failures" => {
            format!(
                "{} issue(s) found, most likely cause: {}",
                summary.failed + summary.errors,
                top.title
            )
        }
        Some(_) => format!(
            "{} issue(s) found; no single root cause identified.",
            summary.failed + summary.errors
        ),
        None => format!("{} issue(s) found.", summary.failed + summary.errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncoloured_output_has_no_escape_codes() {
        let results = vec![ProbeResult::pass("GET /Users", "Phase 1 — Discovery")];
        let rendered = render_terminal(&results, false);
        assert!(!rendered.contains('\x1b'));
    }

    #[test]
    fn coloured_output_has_escape_codes() {
        let results = vec![ProbeResult::fail("GET /Users", "Phase 1", "boom")];
        let rendered = render_terminal(&results, true);
        assert!(rendered.contains('\x1b'));
    }

    #[test]
    fn all_pass_verdict_is_success() {
        let results = vec![ProbeResult::pass("a", "Phase 1")];
        let rendered = render_terminal(&results, false);
        assert!(rendered.contains("All checks passed."));
    }

    #[test]
    fn failures_render_fix_summary_and_verdict() {
        let results = vec![ProbeResult::fail(
            "GET /Users/x",
            "Phase 2",
            "Server response missing required attribute 'meta'",
        )];
        let rendered = render_terminal(&results, false);
        assert!(rendered.contains("Fix Summary"));
        assert!(rendered.contains("Responses omit required 'meta'"));
        assert!(rendered.contains("most likely cause"));
    }

    #[test]
    fn phase_header_prints_once_per_phase() {
        let results = vec![
            ProbeResult::pass("a", "Phase 1"),
            ProbeResult::pass("b", "Phase 1"),
            ProbeResult::pass("c", "Phase 2"),
        ];
        let rendered = render_terminal(&results, false);
        assert_eq!(rendered.matches("Phase 1").count(), 1);
        assert_eq!(rendered.matches("Phase 2").count(), 1);
    }

    #[test]
    fn message_line_is_indented_under_result() {
        let results = vec![ProbeResult::warn("a", "Phase 1", "careful here")];
        let rendered = render_terminal(&results, false);
        assert!(rendered.contains("         careful here"));
    }
}
