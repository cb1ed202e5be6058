//! Relevance filtering of matched branches by changed paths

use crate::config::SyncConfig;
use crate::types::{DiffResult, MatchedBranch};
use crate::vcs::VersionControl;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Auxiliary paths whose changes alone do not justify a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    paths: BTreeSet<String>,
}

impl IgnoreSet {
    /// Build from explicit paths
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Lockfile, build descriptor and marker file from the config, plus extras
    pub fn from_config(config: &SyncConfig) -> Self {
        let mut paths: BTreeSet<String> = config.ignore.extra.iter().cloned().collect();
        paths.extend(config.ignore.lockfile.iter().cloned());
        paths.extend(config.ignore.build_descriptor.iter().cloned());
        paths.insert(config.marker_file.clone());
        Self { paths }
    }

    /// Whether `path` is ignored
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

/// A branch is relevant iff it changes at least one path outside the ignore-set.
///
/// An empty diff is not relevant: there is nothing to merge.
pub fn is_relevant(diff: &DiffResult, ignore: &IgnoreSet) -> bool {
    diff.paths.iter().any(|path| !ignore.contains(path))
}

/// Matched branches split by relevance
#[derive(Debug, Clone, Default)]
pub struct RelevanceOutcome {
    /// Branches to attempt, in input order
    pub relevant: Vec<MatchedBranch>,
    /// Branches dropped because they only touch ignored paths
    pub skipped: Vec<MatchedBranch>,
}

/// Diff each matched branch against `base` and keep the relevant ones.
///
/// `base` and the branch are both resolved on `remote`. A diff that cannot
/// be computed keeps the branch, so the merge attempt records the problem.
pub async fn filter_relevant(
    vcs: &dyn VersionControl,
    matched: Vec<MatchedBranch>,
    remote: &str,
    base: &str,
    ignore: &IgnoreSet,
) -> RelevanceOutcome {
    let mut outcome = RelevanceOutcome::default();
    let base_ref = format!("{remote}/{base}");

    for candidate in matched {
        let head_ref = format!("{remote}/{}", candidate.branch);
        match vcs.changed_files(&base_ref, &head_ref).await {
            Ok(paths) => {
                let diff = DiffResult {
                    branch: candidate.branch.clone(),
                    paths,
                };
                if is_relevant(&diff, ignore) {
                    debug!(branch = %diff.branch, changed = diff.paths.len(), "relevant");
                    outcome.relevant.push(candidate);
                } else {
                    debug!(branch = %diff.branch, paths = ?diff.paths, "only ignored paths changed");
                    outcome.skipped.push(candidate);
                }
            }
            Err(e) => {
                warn!(branch = %candidate.branch, error = %e, "could not diff branch, keeping it");
                outcome.relevant.push(candidate);
            }
        }
    }

    outcome
}
