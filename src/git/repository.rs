//! [`VersionControl`] implementation over a local git checkout

use super::{Git, non_empty_lines};
use crate::error::{Error, Result};
use crate::types::MergeStatus;
use crate::vcs::VersionControl;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

/// A downstream checkout driven through the git CLI
#[derive(Debug, Clone)]
pub struct GitRepository {
    git: Git,
}

impl GitRepository {
    /// Open the repository at `path`
    ///
    /// Fails if `path` is not inside a git work tree.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let git = Git::new(path);
        let inside = git.run(&["rev-parse", "--is-inside-work-tree"]).await?;
        if inside.trim() != "true" {
            return Err(Error::Git(format!(
                "{} is not a git work tree",
                git.path().display()
            )));
        }
        Ok(Self { git })
    }

    /// Top-level directory of the work tree
    pub async fn root(&self) -> Result<PathBuf> {
        let stdout = self.git.run(&["rev-parse", "--show-toplevel"]).await?;
        Ok(PathBuf::from(stdout.trim()))
    }
}

#[async_trait]
impl VersionControl for GitRepository {
    async fn last_change(&self, rev: &str, path: &str) -> Result<Option<String>> {
        let stdout = self
            .git
            .run(&["log", "-1", "--format=%H", rev, "--", path])
            .await?;
        let commit = non_empty_lines(&stdout).next().map(String::from);
        debug!(rev, path, ?commit, "last change");
        Ok(commit)
    }

    async fn read_file_at(&self, rev: &str, path: &str) -> Result<Option<String>> {
        let spec = format!("{rev}:{path}");
        let output = self.git.output(&["show", &spec]).await?;
        if !output.status.success() {
            debug!(spec, "file not present at revision");
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    async fn fetch(&self, remote: &str) -> Result<()> {
        self.git.run(&["fetch", "--prune", "--quiet", remote]).await?;
        Ok(())
    }

    async fn remote_branches(&self, remote: &str) -> Result<BTreeSet<String>> {
        let prefix = format!("refs/remotes/{remote}/");
        let stdout = self
            .git
            .run(&["for-each-ref", "--format=%(refname)", &prefix])
            .await?;
        let branches: BTreeSet<String> = non_empty_lines(&stdout)
            .filter_map(|r| r.strip_prefix(&prefix))
            .filter(|name| *name != "HEAD")
            .map(String::from)
            .collect();
        debug!(remote, count = branches.len(), "listed remote branches");
        Ok(branches)
    }

    async fn changed_files(&self, base: &str, head: &str) -> Result<Vec<String>> {
        let range = format!("{base}...{head}");
        let stdout = self.git.run(&["diff", "--name-only", &range]).await?;
        Ok(non_empty_lines(&stdout).map(String::from).collect())
    }

    async fn rev_parse(&self, rev: &str) -> Result<String> {
        let spec = format!("{rev}^{{commit}}");
        let stdout = self.git.run(&["rev-parse", "--verify", &spec]).await?;
        Ok(stdout.trim().to_string())
    }

    async fn checkout(&self, branch: &str) -> Result<()> {
        self.git.run(&["checkout", "--quiet", branch]).await?;
        Ok(())
    }

    async fn hard_reset(&self, rev: &str) -> Result<()> {
        self.git.run(&["reset", "--hard", "--quiet", rev]).await?;
        Ok(())
    }

    async fn merge(&self, rev: &str) -> Result<MergeStatus> {
        let output = self.git.output(&["merge", "--no-edit", rev]).await?;
        if output.status.success() {
            debug!(rev, "merged cleanly");
            return Ok(MergeStatus::Clean);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let unmerged = self
            .git
            .run(&["diff", "--name-only", "--diff-filter=U"])
            .await
            .unwrap_or_default();
        if stdout.contains("CONFLICT") || !unmerged.trim().is_empty() {
            debug!(rev, "merge stopped on conflicts");
            return Ok(MergeStatus::Conflict);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Git(format!("git merge {rev} failed: {}", stderr.trim())))
    }
}
