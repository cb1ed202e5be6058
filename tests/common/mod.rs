//! Shared test fixtures

#![allow(dead_code)]

pub mod mock_vcs;

pub use mock_vcs::{INTEGRATION, MARKER_FILE, MockMerge, MockVcs, REMOTE, TIP, VcsCall, WorkTree};

use async_trait::async_trait;
use nightly_sync::config::SyncConfig;
use nightly_sync::error::{Error, Result};
use nightly_sync::progress::ProgressCallback;
use nightly_sync::sync::SyncContext;
use nightly_sync::types::{MatchedBranch, MergeAttempt, PrNumber, VersionMarker};
use nightly_sync::upstream::UpstreamHistory;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use std::sync::Mutex;
use tempfile::TempDir;

/// Downstream web URL used by the fixtures
pub const DOWNSTREAM_URL: &str = "https://github.com/example/downstream";

pub fn pr(n: u64) -> PrNumber {
    PrNumber::new(n).expect("positive PR number")
}

pub fn make_matched(n: u64) -> MatchedBranch {
    MatchedBranch {
        pr: pr(n),
        branch: format!("lean-pr-testing-{n}"),
    }
}

/// Context matching the `MockVcs` fixture layout
pub fn sync_context() -> SyncContext {
    let mut config = SyncConfig::default();
    config.report.downstream_url = DOWNSTREAM_URL.to_string();
    SyncContext::from_config(&config)
}

// =============================================================================
// Mock upstream
// =============================================================================

/// Scripted upstream history
pub struct MockUpstream {
    messages: Vec<String>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockUpstream {
    pub fn with_messages(messages: &[&str]) -> Self {
        Self {
            messages: messages.iter().map(|s| (*s).to_string()).collect(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            messages: Vec::new(),
            failure: Some(msg.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(old, new)` pairs queried, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamHistory for MockUpstream {
    async fn commit_messages(
        &self,
        old: &VersionMarker,
        new: &VersionMarker,
    ) -> Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((old.to_string(), new.to_string()));
        match &self.failure {
            Some(msg) => Err(Error::Git(msg.clone())),
            None => Ok(self.messages.clone()),
        }
    }

    fn describe(&self) -> String {
        "mock upstream".to_string()
    }
}

// =============================================================================
// Recording progress
// =============================================================================

/// Progress sink that keeps everything it is told
#[derive(Default)]
pub struct RecordingProgress {
    messages: Mutex<Vec<String>>,
    attempts: Mutex<Vec<MergeAttempt>>,
}

impl RecordingProgress {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> Vec<MergeAttempt> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    async fn on_attempt(&self, attempt: &MergeAttempt) {
        self.attempts.lock().unwrap().push(attempt.clone());
    }
}

// =============================================================================
// Real git repositories
// =============================================================================

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    StdCommand::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn git_in(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    git_in(dir, &["config", "user.email", "test@example.com"]);
    git_in(dir, &["config", "user.name", "Test User"]);
    git_in(dir, &["config", "commit.gpgsign", "false"]);
    git_in(dir, &["config", "tag.gpgsign", "false"]);
}

/// A working clone with a bare `origin` remote, both in one temp dir
pub struct TempGitRepo {
    dir: TempDir,
    work: PathBuf,
    remote: PathBuf,
}

impl Default for TempGitRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TempGitRepo {
    /// Empty repository on `nightly-testing` with a bare `origin`
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let remote = dir.path().join("remote.git");
        let work = dir.path().join("work");

        git_in(
            dir.path(),
            &["init", "--quiet", "--bare", remote.to_str().expect("utf-8 path")],
        );
        git_in(
            dir.path(),
            &[
                "init",
                "--quiet",
                "-b",
                INTEGRATION,
                work.to_str().expect("utf-8 path"),
            ],
        );
        configure_identity(&work);
        git_in(
            &work,
            &["remote", "add", REMOTE, remote.to_str().expect("utf-8 path")],
        );

        Self { dir, work, remote }
    }

    pub fn path(&self) -> &Path {
        &self.work
    }

    pub fn remote_path(&self) -> &Path {
        &self.remote
    }

    /// Run git in the working clone and return trimmed stdout
    pub fn git(&self, args: &[&str]) -> String {
        git_in(&self.work, args)
    }

    /// Write `files` and commit them with `message`
    pub fn commit(&self, message: &str, files: &[(&str, &str)]) -> String {
        for (path, content) in files {
            let full = self.work.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).expect("create parent dir");
            }
            std::fs::write(&full, content).expect("write file");
            self.git(&["add", path]);
        }
        self.git(&["commit", "--quiet", "--allow-empty", "-m", message]);
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// `git status --porcelain` output; empty for a clean tree
    pub fn status(&self) -> String {
        self.git(&["status", "--porcelain"])
    }

    pub fn push(&self, branch: &str) {
        self.git(&["push", "--quiet", REMOTE, branch]);
    }

    /// Branch off `base`, commit `files`, push, and return to `base`
    pub fn push_branch(&self, name: &str, base: &str, files: &[(&str, &str)]) {
        self.git(&["checkout", "--quiet", "-b", name, base]);
        self.commit(&format!("testing branch {name}"), files);
        self.push(name);
        self.git(&["checkout", "--quiet", base]);
    }

    /// Commit the marker file twice (`old` then `new`) and push
    pub fn seed_marker_history(&self, old: &str, new: &str) {
        self.commit("initial toolchain", &[(MARKER_FILE, old)]);
        self.commit("README", &[("README.md", "downstream\n")]);
        self.commit("bump toolchain", &[(MARKER_FILE, new)]);
        self.push(INTEGRATION);
    }
}

/// A standalone upstream repository with tagged release markers
pub struct TempUpstreamRepo {
    dir: TempDir,
}

impl Default for TempUpstreamRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TempUpstreamRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        git_in(dir.path(), &["init", "--quiet", "-b", "master"]);
        configure_identity(dir.path());
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn commit(&self, message: &str) {
        git_in(
            self.dir.path(),
            &["commit", "--quiet", "--allow-empty", "-m", message],
        );
    }

    pub fn tag(&self, name: &str) {
        git_in(self.dir.path(), &["tag", name]);
    }
}
