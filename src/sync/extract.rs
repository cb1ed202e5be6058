//! Extraction of upstream PR numbers from commit messages
//!
//! Grammar: the first line of a commit message, with trailing whitespace
//! removed, must end in a parenthesized group. `(#<digits>)` names a PR;
//! any other trailing group (`(#12a)`, `(revert)`, `(#)`) is malformed and
//! lines without a trailing group carry no reference. Malformed and absent
//! references are skipped but counted.

use crate::error::{Error, Result};
use crate::types::{PrNumber, VersionWindow};
use crate::upstream::UpstreamHistory;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Trailing parenthesized group on a subject line
static TRAILING_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)$").expect("valid regex"));

/// Outcome of parsing one commit message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceParse {
    /// `(#<digits>)` naming a positive PR number
    Found(PrNumber),
    /// Trailing group present but not a PR reference
    Malformed,
    /// No trailing group
    Absent,
}

/// Parse the PR reference at the end of a commit subject
pub fn parse_pr_reference(message: &str) -> ReferenceParse {
    let subject = message.lines().next().unwrap_or_default().trim_end();
    let Some(captures) = TRAILING_GROUP.captures(subject) else {
        return ReferenceParse::Absent;
    };

    let inner = &captures[1];
    let Some(digits) = inner.strip_prefix('#') else {
        return ReferenceParse::Malformed;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return ReferenceParse::Malformed;
    }

    digits
        .parse::<u64>()
        .ok()
        .and_then(PrNumber::new)
        .map_or(ReferenceParse::Malformed, ReferenceParse::Found)
}

/// The PR number referenced by a commit message, if any
pub fn pr_reference(message: &str) -> Option<PrNumber> {
    match parse_pr_reference(message) {
        ReferenceParse::Found(pr) => Some(pr),
        ReferenceParse::Malformed | ReferenceParse::Absent => None,
    }
}

/// PR numbers found in a commit range, plus what was dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Distinct PR numbers in discovery order
    pub pr_numbers: Vec<PrNumber>,
    /// Commit messages examined
    pub commits_scanned: usize,
    /// Messages without a trailing group
    pub absent: usize,
    /// Messages whose trailing group was not a PR reference
    pub malformed: usize,
    /// References to a PR already seen
    pub duplicates: usize,
}

impl Extraction {
    /// Messages that produced no new PR number
    pub const fn suppressed(&self) -> usize {
        self.absent + self.malformed + self.duplicates
    }
}

/// Collect distinct PR numbers from commit messages, in order
pub fn extract_pr_numbers<I, S>(messages: I) -> Extraction
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut extraction = Extraction::default();
    let mut seen = HashSet::new();

    for message in messages {
        extraction.commits_scanned += 1;
        match parse_pr_reference(message.as_ref()) {
            ReferenceParse::Found(pr) => {
                if seen.insert(pr) {
                    extraction.pr_numbers.push(pr);
                } else {
                    extraction.duplicates += 1;
                }
            }
            ReferenceParse::Malformed => {
                debug!(subject = message.as_ref().lines().next(), "malformed PR reference");
                extraction.malformed += 1;
            }
            ReferenceParse::Absent => extraction.absent += 1,
        }
    }

    extraction
}

/// Read the upstream commits in `window` and extract their PR numbers.
///
/// Any upstream failure is fatal and reported as
/// [`Error::UpstreamUnavailable`]. An empty window is not queried.
pub async fn fetch_upstream_changes(
    upstream: &dyn UpstreamHistory,
    window: &VersionWindow,
) -> Result<Extraction> {
    if window.is_empty() {
        info!(%window, "version marker unchanged, no upstream changes");
        return Ok(Extraction::default());
    }

    let messages = upstream
        .commit_messages(&window.old, &window.new)
        .await
        .map_err(|e| match e {
            Error::UpstreamUnavailable(_) => e,
            other => Error::UpstreamUnavailable(format!("{}: {other}", upstream.describe())),
        })?;

    let extraction = extract_pr_numbers(&messages);
    info!(
        %window,
        commits = extraction.commits_scanned,
        prs = extraction.pr_numbers.len(),
        malformed = extraction.malformed,
        absent = extraction.absent,
        duplicates = extraction.duplicates,
        "extracted upstream PR numbers"
    );
    Ok(extraction)
}
