//! Matching PR numbers to downstream testing branches

use crate::types::{MatchedBranch, PrNumber};
use std::collections::BTreeSet;

/// Testing branch name for a PR: `<prefix>-<number>`
pub fn branch_name(prefix: &str, pr: PrNumber) -> String {
    format!("{prefix}-{pr}")
}

/// Pair each PR with its testing branch, dropping PRs without one.
///
/// Output follows the order of `prs`; each PR yields at most one match.
pub fn match_branches(
    prs: &[PrNumber],
    remote_branches: &BTreeSet<String>,
    prefix: &str,
) -> Vec<MatchedBranch> {
    prs.iter()
        .filter_map(|&pr| {
            let branch = branch_name(prefix, pr);
            remote_branches
                .contains(&branch)
                .then_some(MatchedBranch { pr, branch })
        })
        .collect()
}
