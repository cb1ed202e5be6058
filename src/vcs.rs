//! Version control capabilities used by the sync pipeline
//!
//! Every stage that reads history or touches the checkout goes through this
//! trait, so the pipeline can be driven by a real git repository or an
//! in-memory fake.

use crate::error::Result;
use crate::types::MergeStatus;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Version control service trait
///
/// Calls are treated as atomic: each either completes or returns an error.
/// Only the merge orchestrator calls the mutating methods
/// (`checkout`, `hard_reset`, `merge`).
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Commit id of the most recent commit reachable from `rev` that touched `path`
    async fn last_change(&self, rev: &str, path: &str) -> Result<Option<String>>;

    /// Content of `path` at `rev`, or `None` if it does not exist there
    async fn read_file_at(&self, rev: &str, path: &str) -> Result<Option<String>>;

    /// Update remote-tracking refs from `remote`
    async fn fetch(&self, remote: &str) -> Result<()>;

    /// Branch names known on `remote`, without the remote prefix
    async fn remote_branches(&self, remote: &str) -> Result<BTreeSet<String>>;

    /// Paths changed on `head` since it forked from `base`
    async fn changed_files(&self, base: &str, head: &str) -> Result<Vec<String>>;

    /// Resolve a revision to a commit id
    async fn rev_parse(&self, rev: &str) -> Result<String>;

    /// Switch the working tree to `branch`
    async fn checkout(&self, branch: &str) -> Result<()>;

    /// Discard uncommitted state and point the current branch at `rev`
    async fn hard_reset(&self, rev: &str) -> Result<()>;

    /// Merge `rev` into the current branch
    ///
    /// Conflicts are reported as [`MergeStatus::Conflict`]; any other
    /// failure is an error.
    async fn merge(&self, rev: &str) -> Result<MergeStatus>;
}
