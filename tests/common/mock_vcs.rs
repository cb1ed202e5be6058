//! In-memory version control for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use nightly_sync::error::{Error, Result};
use nightly_sync::types::MergeStatus;
use nightly_sync::vcs::VersionControl;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

/// Remote name used by the fixtures
pub const REMOTE: &str = "origin";

/// Integration branch used by the fixtures
pub const INTEGRATION: &str = "nightly-testing";

/// Marker file used by the fixtures
pub const MARKER_FILE: &str = "lean-toolchain";

/// Commit id of the integration branch tip at fixture creation
pub const TIP: &str = "c0ffee";

/// Scripted result for `merge`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockMerge {
    /// Merge succeeds and creates a merge commit
    Clean,
    /// Merge stops with conflicts, leaving the tree dirty
    Conflict,
    /// Merge fails outright, leaving the tree dirty
    Error(String),
}

/// Observable state of the simulated checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkTree {
    /// Checked-out branch
    pub branch: String,
    /// Commit the branch points at
    pub head: String,
    /// Uncommitted or conflicted changes present
    pub dirty: bool,
}

/// Recorded call, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    LastChange { rev: String, path: String },
    ReadFile { rev: String, path: String },
    Fetch(String),
    RemoteBranches(String),
    ChangedFiles { base: String, head: String },
    RevParse(String),
    Checkout(String),
    HardReset(String),
    Merge(String),
}

/// Simple in-memory `VersionControl`
///
/// Features:
/// - Scripted file contents and history per revision
/// - Remote branches with scripted diffs and merge results
/// - A simulated working tree that merges move and resets restore
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockVcs {
    files: Mutex<HashMap<(String, String), String>>,
    last_changes: Mutex<HashMap<(String, String), String>>,
    remote_branches: Mutex<BTreeSet<String>>,
    diffs: Mutex<HashMap<String, Vec<String>>>,
    merges: Mutex<HashMap<String, MockMerge>>,
    refs: Mutex<HashMap<String, String>>,
    local_branches: Mutex<HashMap<String, String>>,
    worktree: Mutex<WorkTree>,
    calls: Mutex<Vec<VcsCall>>,
    // Error injection
    error_on_remote_branches: Mutex<Option<String>>,
    error_on_rev_parse: Mutex<Option<String>>,
    error_on_diff: Mutex<HashSet<String>>,
    error_on_checkout: Mutex<Option<String>>,
    checkout_breaks_after: Mutex<Option<String>>,
    merge_counter: Mutex<u32>,
}

impl Default for MockVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVcs {
    /// A checkout on `nightly-testing` at [`TIP`], matching `origin/nightly-testing`
    pub fn new() -> Self {
        let integration_ref = format!("{REMOTE}/{INTEGRATION}");
        Self {
            files: Mutex::new(HashMap::new()),
            last_changes: Mutex::new(HashMap::new()),
            remote_branches: Mutex::new(BTreeSet::from([INTEGRATION.to_string()])),
            diffs: Mutex::new(HashMap::new()),
            merges: Mutex::new(HashMap::new()),
            refs: Mutex::new(HashMap::from([(integration_ref, TIP.to_string())])),
            local_branches: Mutex::new(HashMap::from([(
                INTEGRATION.to_string(),
                TIP.to_string(),
            )])),
            worktree: Mutex::new(WorkTree {
                branch: INTEGRATION.to_string(),
                head: TIP.to_string(),
                dirty: false,
            }),
            calls: Mutex::new(Vec::new()),
            error_on_remote_branches: Mutex::new(None),
            error_on_rev_parse: Mutex::new(None),
            error_on_diff: Mutex::new(HashSet::new()),
            error_on_checkout: Mutex::new(None),
            checkout_breaks_after: Mutex::new(None),
            merge_counter: Mutex::new(0),
        }
    }

    // === Setup methods ===

    /// Set the content of `path` at `rev`
    pub fn set_file(&self, rev: &str, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert((rev.to_string(), path.to_string()), content.to_string());
    }

    /// Record `commit` as the last change to `path` on `rev`
    pub fn set_last_change(&self, rev: &str, path: &str, commit: &str) {
        self.last_changes
            .lock()
            .unwrap()
            .insert((rev.to_string(), path.to_string()), commit.to_string());
    }

    /// Script a marker file history on the integration ref: `old` before
    /// commit `bump`, `new` now
    pub fn set_marker_history(&self, old: &str, new: &str) {
        let integration_ref = format!("{REMOTE}/{INTEGRATION}");
        self.set_last_change(&integration_ref, MARKER_FILE, "bump");
        self.set_file(&integration_ref, MARKER_FILE, new);
        self.set_file("bump^", MARKER_FILE, old);
    }

    /// Add a remote branch whose diff against the integration branch is `paths`
    pub fn add_branch(&self, name: &str, paths: &[&str]) {
        self.remote_branches.lock().unwrap().insert(name.to_string());
        self.diffs.lock().unwrap().insert(
            format!("{REMOTE}/{name}"),
            paths.iter().map(|s| (*s).to_string()).collect(),
        );
    }

    /// Script the result of merging `branch`
    pub fn set_merge_result(&self, branch: &str, result: MockMerge) {
        self.merges
            .lock()
            .unwrap()
            .insert(format!("{REMOTE}/{branch}"), result);
    }

    /// Leave uncommitted changes in the working tree
    pub fn make_dirty(&self) {
        self.worktree.lock().unwrap().dirty = true;
    }

    /// Switch the checkout to another branch without going through the trait
    pub fn force_branch(&self, branch: &str, head: &str) {
        let mut tree = self.worktree.lock().unwrap();
        tree.branch = branch.to_string();
        tree.head = head.to_string();
    }

    // === Error injection methods ===

    /// Make `remote_branches` return an error
    pub fn fail_remote_branches(&self, msg: &str) {
        *self.error_on_remote_branches.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `rev_parse` return an error
    pub fn fail_rev_parse(&self, msg: &str) {
        *self.error_on_rev_parse.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `changed_files` fail for `branch`
    pub fn fail_diff(&self, branch: &str) {
        self.error_on_diff
            .lock()
            .unwrap()
            .insert(format!("{REMOTE}/{branch}"));
    }

    /// Make `checkout` return an error
    pub fn fail_checkout(&self, msg: &str) {
        *self.error_on_checkout.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `checkout` fail from the moment `branch` is merged
    pub fn break_checkout_after_merge(&self, branch: &str) {
        *self.checkout_breaks_after.lock().unwrap() = Some(format!("{REMOTE}/{branch}"));
    }

    /// Make `checkout` succeed again
    pub fn clear_checkout_failure(&self) {
        *self.error_on_checkout.lock().unwrap() = None;
    }

    // === Call verification methods ===

    /// Current simulated working tree
    pub fn worktree(&self) -> WorkTree {
        self.worktree.lock().unwrap().clone()
    }

    /// All calls, in order
    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Revisions passed to `merge`, in order
    pub fn merge_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                VcsCall::Merge(rev) => Some(rev),
                _ => None,
            })
            .collect()
    }

    /// Whether any call mutated the checkout
    pub fn mutated(&self) -> bool {
        self.calls().iter().any(|c| {
            matches!(
                c,
                VcsCall::Checkout(_) | VcsCall::HardReset(_) | VcsCall::Merge(_)
            )
        })
    }

    /// Number of `remote_branches` calls
    pub fn remote_branch_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, VcsCall::RemoteBranches(_)))
            .count()
    }

    fn record(&self, call: VcsCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn resolve(&self, rev: &str) -> Option<String> {
        if let Some(commit) = self.refs.lock().unwrap().get(rev) {
            return Some(commit.clone());
        }
        if let Some(commit) = self.local_branches.lock().unwrap().get(rev) {
            return Some(commit.clone());
        }
        // Commit ids resolve to themselves
        let known_commit = self
            .local_branches
            .lock()
            .unwrap()
            .values()
            .chain(self.refs.lock().unwrap().values())
            .any(|c| c == rev)
            || rev.starts_with("merge(");
        known_commit.then(|| rev.to_string())
    }
}

#[async_trait]
impl VersionControl for MockVcs {
    async fn last_change(&self, rev: &str, path: &str) -> Result<Option<String>> {
        self.record(VcsCall::LastChange {
            rev: rev.to_string(),
            path: path.to_string(),
        });
        Ok(self
            .last_changes
            .lock()
            .unwrap()
            .get(&(rev.to_string(), path.to_string()))
            .cloned())
    }

    async fn read_file_at(&self, rev: &str, path: &str) -> Result<Option<String>> {
        self.record(VcsCall::ReadFile {
            rev: rev.to_string(),
            path: path.to_string(),
        });
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&(rev.to_string(), path.to_string()))
            .cloned())
    }

    async fn fetch(&self, remote: &str) -> Result<()> {
        self.record(VcsCall::Fetch(remote.to_string()));
        Ok(())
    }

    async fn remote_branches(&self, remote: &str) -> Result<BTreeSet<String>> {
        self.record(VcsCall::RemoteBranches(remote.to_string()));
        if let Some(msg) = self.error_on_remote_branches.lock().unwrap().as_ref() {
            return Err(Error::Git(msg.clone()));
        }
        Ok(self.remote_branches.lock().unwrap().clone())
    }

    async fn changed_files(&self, base: &str, head: &str) -> Result<Vec<String>> {
        self.record(VcsCall::ChangedFiles {
            base: base.to_string(),
            head: head.to_string(),
        });
        if self.error_on_diff.lock().unwrap().contains(head) {
            return Err(Error::Git(format!("bad revision '{base}...{head}'")));
        }
        Ok(self
            .diffs
            .lock()
            .unwrap()
            .get(head)
            .cloned()
            .unwrap_or_default())
    }

    async fn rev_parse(&self, rev: &str) -> Result<String> {
        self.record(VcsCall::RevParse(rev.to_string()));
        if let Some(msg) = self.error_on_rev_parse.lock().unwrap().as_ref() {
            return Err(Error::Git(msg.clone()));
        }
        self.resolve(rev)
            .ok_or_else(|| Error::Git(format!("unknown revision '{rev}'")))
    }

    async fn checkout(&self, branch: &str) -> Result<()> {
        self.record(VcsCall::Checkout(branch.to_string()));
        if let Some(msg) = self.error_on_checkout.lock().unwrap().as_ref() {
            return Err(Error::Git(msg.clone()));
        }

        let mut tree = self.worktree.lock().unwrap();
        if tree.dirty {
            return Err(Error::Git(
                "local changes would be overwritten by checkout".to_string(),
            ));
        }

        let mut local = self.local_branches.lock().unwrap();
        let head = match local.get(branch) {
            Some(commit) => commit.clone(),
            None => {
                let remote_ref = format!("{REMOTE}/{branch}");
                let commit = self
                    .refs
                    .lock()
                    .unwrap()
                    .get(&remote_ref)
                    .cloned()
                    .ok_or_else(|| Error::Git(format!("pathspec '{branch}' did not match")))?;
                local.insert(branch.to_string(), commit.clone());
                commit
            }
        };
        tree.branch = branch.to_string();
        tree.head = head;
        Ok(())
    }

    async fn hard_reset(&self, rev: &str) -> Result<()> {
        self.record(VcsCall::HardReset(rev.to_string()));
        let target = if rev == "HEAD" {
            self.worktree.lock().unwrap().head.clone()
        } else {
            self.resolve(rev)
                .ok_or_else(|| Error::Git(format!("unknown revision '{rev}'")))?
        };

        let mut tree = self.worktree.lock().unwrap();
        tree.head = target.clone();
        tree.dirty = false;
        self.local_branches
            .lock()
            .unwrap()
            .insert(tree.branch.clone(), target);
        Ok(())
    }

    async fn merge(&self, rev: &str) -> Result<MergeStatus> {
        self.record(VcsCall::Merge(rev.to_string()));
        if self.checkout_breaks_after.lock().unwrap().as_deref() == Some(rev) {
            *self.error_on_checkout.lock().unwrap() = Some("index.lock exists".to_string());
        }
        let result = self
            .merges
            .lock()
            .unwrap()
            .get(rev)
            .cloned()
            .unwrap_or(MockMerge::Clean);

        let mut tree = self.worktree.lock().unwrap();
        match result {
            MockMerge::Clean => {
                let mut counter = self.merge_counter.lock().unwrap();
                *counter += 1;
                let commit = format!("merge({}, {rev}, {})", tree.head, *counter);
                tree.head = commit.clone();
                self.local_branches
                    .lock()
                    .unwrap()
                    .insert(tree.branch.clone(), commit);
                Ok(MergeStatus::Clean)
            }
            MockMerge::Conflict => {
                tree.dirty = true;
                Ok(MergeStatus::Conflict)
            }
            MockMerge::Error(msg) => {
                tree.dirty = true;
                Err(Error::Git(msg))
            }
        }
    }
}
