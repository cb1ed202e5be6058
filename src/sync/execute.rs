//! Merge execution - effectful operations
//!
//! This module owns the checkout for the duration of a run. It merges each
//! relevant testing branch into a clean copy of the integration branch,
//! records the outcome, and restores the clean copy before moving on.
//! Branches are processed one at a time: they all share one working tree.

use crate::error::{Error, Result};
use crate::progress::ProgressCallback;
use crate::report::compare_link;
use crate::types::{MatchedBranch, MergeAttempt, MergeFailure, MergeOutcome, MergeStatus, Report};
use crate::vcs::VersionControl;
use tracing::{debug, info, warn};

/// Options for merge execution
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Downstream remote holding the testing branches
    pub remote: String,
    /// Branch the testing branches are merged into
    pub integration_branch: String,
    /// Web URL of the downstream repository (compare links)
    pub downstream_url: String,
    /// Leave a successful merge of the final branch applied
    ///
    /// Only meaningful for single-branch runs, where the caller persists
    /// the merge itself.
    pub keep_last_success: bool,
}

impl MergeOptions {
    fn integration_ref(&self) -> String {
        format!("{}/{}", self.remote, self.integration_branch)
    }
}

/// Discard local state and put the integration branch back on `snapshot`
async fn restore_snapshot(
    vcs: &dyn VersionControl,
    integration_branch: &str,
    snapshot: &str,
) -> Result<()> {
    vcs.hard_reset("HEAD").await?;
    vcs.checkout(integration_branch).await?;
    vcs.hard_reset(snapshot).await?;
    Ok(())
}

/// Clean state, then merge; never fails, only reports
async fn attempt_merge(
    vcs: &dyn VersionControl,
    candidate: &MatchedBranch,
    snapshot: &str,
    options: &MergeOptions,
) -> MergeOutcome {
    if let Err(e) = restore_snapshot(vcs, &options.integration_branch, snapshot).await {
        warn!(branch = %candidate.branch, error = %e, "could not restore clean state");
        return MergeOutcome::Failure(MergeFailure::Error(format!(
            "could not restore clean state: {e}"
        )));
    }

    let rev = format!("{}/{}", options.remote, candidate.branch);
    match vcs.merge(&rev).await {
        Ok(MergeStatus::Clean) => MergeOutcome::Success,
        Ok(MergeStatus::Conflict) => MergeOutcome::Failure(MergeFailure::Conflict),
        Err(e) => MergeOutcome::Failure(MergeFailure::Error(e.to_string())),
    }
}

/// Record that the checkout was not restored after the final attempt
fn left_dirty(outcome: &MergeOutcome, error: &Error) -> MergeOutcome {
    let before = match outcome {
        MergeOutcome::Success => "merged".to_string(),
        MergeOutcome::Failure(reason) => reason.to_string(),
    };
    MergeOutcome::Failure(MergeFailure::Error(format!(
        "{before}, but checkout left dirty: could not restore clean state: {error}"
    )))
}

/// Merge each branch into a clean integration branch (EFFECTFUL)
///
/// Every branch is attempted regardless of earlier failures. Before and
/// after each attempt the checkout is restored to the integration branch
/// tip captured at the start, so the working tree ends where it began
/// (unless `keep_last_success` keeps a final successful merge). If the
/// final restore fails, the last attempt is recorded as a failure.
///
/// # Arguments
/// * `vcs` - Checkout to merge in
/// * `branches` - Relevant branches, in the order to attempt them
/// * `options` - Remote, integration branch and link settings
/// * `progress` - Progress callback for status updates
///
/// # Returns
/// A `Report` with one `MergeAttempt` per branch
pub async fn merge_branches(
    vcs: &dyn VersionControl,
    branches: &[MatchedBranch],
    options: &MergeOptions,
    progress: &dyn ProgressCallback,
) -> Report {
    let mut report = Report::new();
    if branches.is_empty() {
        debug!("no relevant branches, nothing to merge");
        return report;
    }

    let make_attempt = |candidate: &MatchedBranch, outcome| MergeAttempt {
        pr: candidate.pr,
        branch: candidate.branch.clone(),
        outcome,
        compare_link: compare_link(
            &options.downstream_url,
            &options.integration_branch,
            &candidate.branch,
        ),
    };

    let integration_ref = options.integration_ref();
    let snapshot = match vcs.rev_parse(&integration_ref).await {
        Ok(commit) => commit,
        Err(e) => {
            warn!(%integration_ref, error = %e, "cannot resolve integration branch");
            for candidate in branches {
                let outcome = MergeOutcome::Failure(MergeFailure::Error(format!(
                    "cannot resolve {integration_ref}: {e}"
                )));
                let attempt = make_attempt(candidate, outcome);
                progress.on_attempt(&attempt).await;
                report.record(attempt);
            }
            return report;
        }
    };
    info!(%integration_ref, %snapshot, count = branches.len(), "merging testing branches");

    let last = branches.len() - 1;
    for (index, candidate) in branches.iter().enumerate() {
        progress
            .on_message(&format!(
                "Merging PR #{} ({})",
                candidate.pr, candidate.branch
            ))
            .await;

        let mut outcome = attempt_merge(vcs, candidate, &snapshot, options).await;
        match &outcome {
            MergeOutcome::Success => info!(branch = %candidate.branch, "merged"),
            MergeOutcome::Failure(reason) => {
                info!(branch = %candidate.branch, %reason, "merge failed");
            }
        }

        let keep = options.keep_last_success && index == last && outcome.is_success();
        if keep {
            debug!(branch = %candidate.branch, "leaving merge applied");
        } else if let Err(e) =
            restore_snapshot(vcs, &options.integration_branch, &snapshot).await
        {
            warn!(branch = %candidate.branch, error = %e, "could not restore clean state after merge");
            // Earlier branches are covered by the next attempt's restore
            if index == last {
                outcome = left_dirty(&outcome, &e);
            }
        }

        let attempt = make_attempt(candidate, outcome);
        progress.on_attempt(&attempt).await;
        report.record(attempt);
    }

    report
}
