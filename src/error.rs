//! Error types for nightly-sync

use thiserror::Error;

/// Errors that can abort a sync run or a CLI command
///
/// Merge conflicts are not errors: they are recorded as
/// [`MergeFailure`](crate::types::MergeFailure) values in the report.
#[derive(Error, Debug)]
pub enum Error {
    /// The version window could not be established from the marker file history
    #[error("version history unavailable: {0}")]
    HistoryUnavailable(String),

    /// The upstream project's history could not be read for the window
    #[error("upstream history unavailable: {0}")]
    UpstreamUnavailable(String),

    /// No remote branch exists for the requested PR
    #[error("no branch '{0}' on the remote")]
    BranchNotFound(String),

    /// A PR identifier did not parse as a positive integer
    #[error("invalid PR number: {0}")]
    InvalidPrNumber(String),

    /// A git command failed
    #[error("git error: {0}")]
    Git(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Configuration could not be loaded or is invalid
    #[error("config error: {0}")]
    Config(String),

    /// Report delivery failed
    #[error("notification error: {0}")]
    Notify(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
