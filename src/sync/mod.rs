//! Sync engine for PR testing branches
//!
//! Two-phase pattern:
//! 1. Plan - resolve the version window, extract upstream PRs, match
//!    branches and filter by relevance (reads only)
//! 2. Execute - merge the relevant branches and build the `Report`
//!
//! Stage outputs are passed along as values; nothing is stashed in
//! process state between stages.

mod execute;
mod extract;
mod matcher;
mod relevance;
mod window;

pub use execute::{MergeOptions, merge_branches};
pub use extract::{
    Extraction, ReferenceParse, extract_pr_numbers, fetch_upstream_changes, parse_pr_reference,
    pr_reference,
};
pub use matcher::{branch_name, match_branches};
pub use relevance::{IgnoreSet, RelevanceOutcome, filter_relevant, is_relevant};
pub use window::{parse_marker, resolve_version_window};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::progress::ProgressCallback;
use crate::types::{MatchedBranch, MergeAttempt, PrNumber, Report, VersionWindow};
use crate::upstream::UpstreamHistory;
use crate::vcs::VersionControl;
use serde::Serialize;
use tracing::info;

/// Settings shared by every stage of a run
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Downstream remote name
    pub remote: String,
    /// Branch receiving the merges
    pub integration_branch: String,
    /// Testing branch prefix
    pub branch_prefix: String,
    /// Version marker file path
    pub marker_file: String,
    /// Marker delimiter within the file
    pub marker_delimiter: char,
    /// Paths that do not make a branch relevant
    pub ignore: IgnoreSet,
    /// Web URL of the downstream repository
    pub downstream_url: String,
}

impl SyncContext {
    /// Build from a loaded config
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            remote: config.remote.clone(),
            integration_branch: config.integration_branch.clone(),
            branch_prefix: config.branch_prefix.clone(),
            marker_file: config.marker_file.clone(),
            marker_delimiter: config.marker_delimiter,
            ignore: IgnoreSet::from_config(config),
            downstream_url: config.report.downstream_url.clone(),
        }
    }

    /// `<remote>/<integration_branch>`
    pub fn integration_ref(&self) -> String {
        format!("{}/{}", self.remote, self.integration_branch)
    }

    fn merge_options(&self, keep_last_success: bool) -> MergeOptions {
        MergeOptions {
            remote: self.remote.clone(),
            integration_branch: self.integration_branch.clone(),
            downstream_url: self.downstream_url.clone(),
            keep_last_success,
        }
    }
}

/// Everything decided before touching the checkout
#[derive(Debug, Clone, Serialize)]
pub struct SyncPlan {
    /// Version window searched
    pub window: VersionWindow,
    /// PR numbers found upstream and what was dropped
    pub extraction: Extraction,
    /// PRs with an existing testing branch
    pub matched: Vec<MatchedBranch>,
    /// Matched branches to merge
    pub relevant: Vec<MatchedBranch>,
    /// Matched branches that only touch ignored paths
    pub skipped: Vec<MatchedBranch>,
}

impl SyncPlan {
    /// True when there is nothing to merge
    pub fn is_empty(&self) -> bool {
        self.relevant.is_empty()
    }
}

/// Build the sync plan (reads history, never mutates the checkout)
///
/// Fatal errors (`HistoryUnavailable`, `UpstreamUnavailable`) surface here,
/// before any merge is attempted.
pub async fn plan_sync(
    vcs: &dyn VersionControl,
    upstream: &dyn UpstreamHistory,
    ctx: &SyncContext,
) -> Result<SyncPlan> {
    let window = resolve_version_window(
        vcs,
        &ctx.integration_ref(),
        &ctx.marker_file,
        ctx.marker_delimiter,
    )
    .await?;

    let extraction = fetch_upstream_changes(upstream, &window).await?;

    if extraction.pr_numbers.is_empty() {
        info!(%window, "no upstream PRs in window");
        return Ok(SyncPlan {
            window,
            extraction,
            matched: Vec::new(),
            relevant: Vec::new(),
            skipped: Vec::new(),
        });
    }

    let remote_branches = vcs.remote_branches(&ctx.remote).await?;
    let matched = match_branches(&extraction.pr_numbers, &remote_branches, &ctx.branch_prefix);
    info!(
        candidates = extraction.pr_numbers.len(),
        matched = matched.len(),
        "matched testing branches"
    );

    let RelevanceOutcome { relevant, skipped } = filter_relevant(
        vcs,
        matched.clone(),
        &ctx.remote,
        &ctx.integration_branch,
        &ctx.ignore,
    )
    .await;
    info!(
        relevant = relevant.len(),
        skipped = skipped.len(),
        "filtered by relevance"
    );

    Ok(SyncPlan {
        window,
        extraction,
        matched,
        relevant,
        skipped,
    })
}

/// Merge the plan's relevant branches (EFFECTFUL)
///
/// Never fails: per-branch problems are recorded in the report.
pub async fn execute_sync(
    vcs: &dyn VersionControl,
    plan: &SyncPlan,
    ctx: &SyncContext,
    progress: &dyn ProgressCallback,
) -> Report {
    merge_branches(vcs, &plan.relevant, &ctx.merge_options(false), progress).await
}

/// Plan and execute a full batch run
pub async fn run_pipeline(
    vcs: &dyn VersionControl,
    upstream: &dyn UpstreamHistory,
    ctx: &SyncContext,
    progress: &dyn ProgressCallback,
) -> Result<(SyncPlan, Report)> {
    let plan = plan_sync(vcs, upstream, ctx).await?;
    let report = execute_sync(vcs, &plan, ctx, progress).await;
    Ok((plan, report))
}

/// Result of merging a single PR's testing branch
#[derive(Debug, Clone)]
pub enum SingleOutcome {
    /// The branch merged cleanly
    Merged(MergeAttempt),
    /// The merge failed
    Failed(MergeAttempt),
    /// The branch only touches ignored paths; nothing was attempted
    Irrelevant(MatchedBranch),
}

impl SingleOutcome {
    /// Exit signal for scripting: everything but a failed merge is success
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Relevance check and one merge attempt for a single PR
///
/// With `keep`, a successful merge is left applied on the integration
/// branch for the caller to push; otherwise the checkout is restored.
pub async fn run_single(
    vcs: &dyn VersionControl,
    ctx: &SyncContext,
    pr: PrNumber,
    keep: bool,
    progress: &dyn ProgressCallback,
) -> Result<SingleOutcome> {
    let branch = branch_name(&ctx.branch_prefix, pr);
    let remote_branches = vcs.remote_branches(&ctx.remote).await?;
    let matched = match_branches(&[pr], &remote_branches, &ctx.branch_prefix);
    if matched.is_empty() {
        return Err(Error::BranchNotFound(format!("{}/{branch}", ctx.remote)));
    }

    let RelevanceOutcome { relevant, skipped } = filter_relevant(
        vcs,
        matched,
        &ctx.remote,
        &ctx.integration_branch,
        &ctx.ignore,
    )
    .await;
    if let Some(candidate) = skipped.into_iter().next() {
        info!(branch = %candidate.branch, "branch only touches ignored paths");
        return Ok(SingleOutcome::Irrelevant(candidate));
    }

    let report = merge_branches(vcs, &relevant, &ctx.merge_options(keep), progress).await;
    let Report {
        mut successes,
        mut failures,
        ..
    } = report;
    if let Some(attempt) = successes.pop() {
        Ok(SingleOutcome::Merged(attempt))
    } else if let Some(attempt) = failures.pop() {
        Ok(SingleOutcome::Failed(attempt))
    } else {
        Err(Error::Internal(format!("no merge attempt recorded for {branch}")))
    }
}
