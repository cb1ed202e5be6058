//! Rendering of sync reports
//!
//! The text form is meant for a chat message: two named sections, each a
//! bulleted list, followed by copy-pasteable recovery commands for the
//! failures. Empty sections say so explicitly.

use crate::error::{Error, Result};
use crate::types::{MergeAttempt, MergeOutcome, Report};
use std::fmt::Write as _;

/// Line shown when no merge succeeded
pub const NOTHING_MERGED: &str = "nothing merged";

/// Line shown when no merge failed
pub const ALL_MERGED: &str = "none, all merged";

/// Web link comparing `base` with `branch` on the downstream repository
pub fn compare_link(downstream_url: &str, base: &str, branch: &str) -> String {
    format!(
        "{}/compare/{base}...{branch}",
        downstream_url.trim_end_matches('/')
    )
}

/// Settings for text rendering
#[derive(Debug, Clone)]
pub struct ReportStyle {
    /// Branch the merges went into (section headings)
    pub integration_branch: String,
    /// Command a human runs to retry one PR, followed by its number
    pub recovery_command: String,
}

/// Shell line to retry a failed merge: `<command> <n> # <branch>`
pub fn recovery_line(command: &str, attempt: &MergeAttempt) -> String {
    format!("{command} {} # {}", attempt.pr, attempt.branch)
}

fn bullet(attempt: &MergeAttempt) -> String {
    match &attempt.outcome {
        MergeOutcome::Success => format!("- PR #{}: {}", attempt.pr, attempt.compare_link),
        MergeOutcome::Failure(reason) => format!(
            "- PR #{} ({reason}): {}",
            attempt.pr, attempt.compare_link
        ),
    }
}

/// Render the report as text
pub fn render_report(report: &Report, style: &ReportStyle) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "### Successful merges into {}",
        style.integration_branch
    );
    if report.successes.is_empty() {
        let _ = writeln!(out, "- {NOTHING_MERGED}");
    }
    for attempt in &report.successes {
        let _ = writeln!(out, "{}", bullet(attempt));
    }

    out.push('\n');
    let _ = writeln!(out, "### Failed merges into {}", style.integration_branch);
    if report.failures.is_empty() {
        let _ = writeln!(out, "- {ALL_MERGED}");
    }
    for attempt in &report.failures {
        let _ = writeln!(out, "{}", bullet(attempt));
    }

    if !report.failures.is_empty() {
        out.push('\n');
        out.push_str("Retry manually with:\n```\n");
        for attempt in &report.failures {
            let _ = writeln!(out, "{}", recovery_line(&style.recovery_command, attempt));
        }
        out.push_str("```\n");
    }

    out
}

/// Render the report as pretty-printed JSON
pub fn render_report_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| Error::Internal(format!("failed to serialize report: {e}")))
}
