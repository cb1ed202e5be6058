//! Git command-line backend
//!
//! Runs the `git` binary against a repository path. [`GitRepository`]
//! implements [`VersionControl`] for the downstream checkout; the same
//! [`Git`] runner backs the local-clone upstream history.

mod repository;

pub use repository::GitRepository;

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Thin async wrapper around `git -C <path> ...`
#[derive(Debug, Clone)]
pub struct Git {
    repo: PathBuf,
}

impl Git {
    /// Run git commands inside `repo`
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// Repository path
    pub fn path(&self) -> &Path {
        &self.repo
    }

    /// Run git and return the raw output, whatever the exit status
    pub async fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(repo = %self.repo.display(), ?args, "running git");
        Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Git(format!("failed to run git {}: {e}", args.join(" "))))
    }

    /// Run git and return stdout, failing on a nonzero exit status
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run git and report only whether it exited successfully
    pub async fn succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.output(args).await?.status.success())
    }
}

/// Split command output into trimmed, non-empty lines
pub(crate) fn non_empty_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().map(str::trim).filter(|l| !l.is_empty())
}
