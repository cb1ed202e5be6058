//! Core types for nightly-sync

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::str::FromStr;

/// An opaque release marker, e.g. `nightly-2024-05-01`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionMarker(String);

impl VersionMarker {
    /// Wrap a marker string
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    /// The marker text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `(old, new)` pair bounding the upstream search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionWindow {
    /// Marker before the last change to the marker file
    pub old: VersionMarker,
    /// Marker currently recorded
    pub new: VersionMarker,
}

impl VersionWindow {
    /// True when the marker did not actually move
    pub fn is_empty(&self) -> bool {
        self.old == self.new
    }
}

impl std::fmt::Display for VersionWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.old, self.new)
    }
}

/// Upstream pull request number (always positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(NonZeroU64);

impl PrNumber {
    /// Create from a raw number, rejecting zero
    pub const fn new(number: u64) -> Option<Self> {
        match NonZeroU64::new(number) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// The raw number
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for PrNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PrNumber {
    type Err = Error;

    /// Parse a PR number from user input.
    ///
    /// Accepts a leading `#`. Anything other than ASCII digits (signs,
    /// whitespace inside, separators) is rejected, as is zero.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPrNumber(s.to_string()));
        }
        digits
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| Error::InvalidPrNumber(s.to_string()))
    }
}

/// A PR paired with its downstream testing branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedBranch {
    /// Upstream PR number
    pub pr: PrNumber,
    /// Branch name on the downstream remote (without remote prefix)
    pub branch: String,
}

/// Paths changed by a branch relative to the integration branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// Branch the diff was computed for
    pub branch: String,
    /// Changed paths, repository-relative
    pub paths: Vec<String>,
}

/// Why a merge attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum MergeFailure {
    /// The merge stopped on conflicts
    Conflict,
    /// Any other nonzero completion, including failed resets
    Error(String),
}

impl std::fmt::Display for MergeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict => write!(f, "merge conflict"),
            Self::Error(msg) => write!(f, "{msg}"),
        }
    }
}

/// Outcome of one merge attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Merged cleanly
    Success,
    /// Did not merge
    Failure(MergeFailure),
}

impl MergeOutcome {
    /// Whether the merge went through
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Record of one attempt to merge a testing branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAttempt {
    /// Upstream PR number
    pub pr: PrNumber,
    /// Testing branch that was merged
    pub branch: String,
    /// What happened
    pub outcome: MergeOutcome,
    /// Web link comparing the integration branch with the testing branch
    pub compare_link: String,
}

/// Result of merge status from the version control collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    /// Merge completed without conflicts
    Clean,
    /// Merge stopped with conflicts in the working tree
    Conflict,
}

/// Accumulated outcomes of one sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Successful attempts, in attempt order
    pub successes: Vec<MergeAttempt>,
    /// Failed attempts, in attempt order
    pub failures: Vec<MergeAttempt>,
    /// When the run produced this report
    pub generated_at: DateTime<Utc>,
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    /// An empty report stamped with the current time
    pub fn new() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// File an attempt under successes or failures
    pub fn record(&mut self, attempt: MergeAttempt) {
        if attempt.outcome.is_success() {
            self.successes.push(attempt);
        } else {
            self.failures.push(attempt);
        }
    }

    /// True when nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.successes.is_empty() && self.failures.is_empty()
    }

    /// Number of attempts recorded
    pub fn attempt_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}
