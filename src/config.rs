//! Configuration for nightly-sync
//!
//! Loaded from TOML. Every field has a default, so a missing file yields
//! a usable configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Filename looked up at the repository root.
pub const REPO_CONFIG_FILE: &str = ".nightly-sync.toml";

/// Directory under the user config dir.
const USER_CONFIG_DIR: &str = "nightly-sync";

/// Filename inside [`USER_CONFIG_DIR`].
const USER_CONFIG_FILE: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Downstream remote name
    pub remote: String,
    /// Long-lived branch that accumulates the testing merges
    pub integration_branch: String,
    /// Testing branches are named `<branch_prefix>-<PR number>`
    pub branch_prefix: String,
    /// File holding the toolchain version marker
    pub marker_file: String,
    /// The marker is the text after this delimiter
    pub marker_delimiter: char,
    /// Paths that do not make a branch relevant
    pub ignore: IgnoreConfig,
    /// Where upstream history comes from
    pub upstream: UpstreamConfig,
    /// Report rendering
    pub report: ReportConfig,
    /// Report delivery
    pub notify: NotifyConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            integration_branch: "nightly-testing".to_string(),
            branch_prefix: "lean-pr-testing".to_string(),
            marker_file: "lean-toolchain".to_string(),
            marker_delimiter: ':',
            ignore: IgnoreConfig::default(),
            upstream: UpstreamConfig::default(),
            report: ReportConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Auxiliary files excluded from relevance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IgnoreConfig {
    /// Dependency lock / manifest file
    pub lockfile: Option<String>,
    /// Build descriptor
    pub build_descriptor: Option<String>,
    /// Additional paths
    pub extra: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            lockfile: Some("lake-manifest.json".to_string()),
            build_descriptor: Some("lakefile.lean".to_string()),
            extra: Vec::new(),
        }
    }
}

/// Source of upstream history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamKind {
    /// GitHub compare API
    #[default]
    GitHub,
    /// A local clone of the upstream project
    Checkout,
}

/// Upstream project settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Backend used to read history
    pub kind: UpstreamKind,
    /// `owner/name` of the upstream GitHub repository
    pub repo: String,
    /// API base URL for GitHub Enterprise (None for api.github.com)
    pub api_url: Option<String>,
    /// Environment variable holding an optional API token
    pub token_env: String,
    /// Path of the local clone (checkout backend)
    pub path: Option<PathBuf>,
    /// Fetch tags in the local clone before reading history
    pub fetch: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            kind: UpstreamKind::GitHub,
            repo: "leanprover/lean4".to_string(),
            api_url: None,
            token_env: "GITHUB_TOKEN".to_string(),
            path: None,
            fetch: true,
        }
    }
}

impl UpstreamConfig {
    /// Split `repo` into owner and name
    pub fn owner_and_name(&self) -> Result<(&str, &str)> {
        match self.repo.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok((owner, name))
            }
            _ => Err(Error::Config(format!(
                "upstream.repo must look like 'owner/name', got '{}'",
                self.repo
            ))),
        }
    }
}

/// Report rendering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Web URL of the downstream repository, used for compare links
    pub downstream_url: String,
    /// Command printed for manual retries, followed by the PR number
    pub recovery_command: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            downstream_url: "https://github.com/leanprover-community/mathlib4".to_string(),
            recovery_command: "nightly-sync merge".to_string(),
        }
    }
}

/// How the rendered report is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    /// Print to stdout
    #[default]
    Stdout,
    /// Write to a file
    File,
    /// POST to a webhook
    Webhook,
    /// Do not deliver
    None,
}

/// Notification settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Delivery mechanism
    pub kind: NotifyKind,
    /// Output path (file)
    pub path: Option<PathBuf>,
    /// Endpoint (webhook)
    pub url: Option<String>,
}

impl SyncConfig {
    /// Check field values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.remote.trim().is_empty() {
            return Err(Error::Config("remote must not be empty".to_string()));
        }
        if self.integration_branch.trim().is_empty() {
            return Err(Error::Config(
                "integration_branch must not be empty".to_string(),
            ));
        }
        if self.branch_prefix.trim().is_empty() {
            return Err(Error::Config("branch_prefix must not be empty".to_string()));
        }
        if self.marker_file.trim().is_empty() {
            return Err(Error::Config("marker_file must not be empty".to_string()));
        }

        Url::parse(&self.report.downstream_url).map_err(|e| {
            Error::Config(format!(
                "invalid report.downstream_url '{}': {e}",
                self.report.downstream_url
            ))
        })?;

        match self.upstream.kind {
            UpstreamKind::GitHub => {
                self.upstream.owner_and_name()?;
                if let Some(ref api_url) = self.upstream.api_url {
                    Url::parse(api_url).map_err(|e| {
                        Error::Config(format!("invalid upstream.api_url '{api_url}': {e}"))
                    })?;
                }
            }
            UpstreamKind::Checkout => {
                if self.upstream.path.is_none() {
                    return Err(Error::Config(
                        "upstream.path is required when upstream.kind = \"checkout\"".to_string(),
                    ));
                }
            }
        }

        match self.notify.kind {
            NotifyKind::File if self.notify.path.is_none() => Err(Error::Config(
                "notify.path is required when notify.kind = \"file\"".to_string(),
            )),
            NotifyKind::Webhook => {
                let url = self.notify.url.as_deref().ok_or_else(|| {
                    Error::Config(
                        "notify.url is required when notify.kind = \"webhook\"".to_string(),
                    )
                })?;
                Url::parse(url)
                    .map_err(|e| Error::Config(format!("invalid notify.url '{url}': {e}")))?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Path of the per-user config file, if the platform has a config dir
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE))
}

/// Find the config file to use.
///
/// An explicit path wins; otherwise the repository file, then the user
/// file. Returns `None` when none exist.
pub fn locate_config(repo_root: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let repo_file = repo_root.join(REPO_CONFIG_FILE);
    if repo_file.is_file() {
        return Some(repo_file);
    }
    user_config_path().filter(|p| p.is_file())
}

/// Parse and validate a config from TOML text
pub fn parse_config(content: &str) -> Result<SyncConfig> {
    let config: SyncConfig =
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Load the config from disk.
///
/// Returns the defaults if no config file is found. An explicit path that
/// does not exist is an error.
pub fn load_config(repo_root: &Path, explicit: Option<&Path>) -> Result<SyncConfig> {
    let Some(path) = locate_config(repo_root, explicit) else {
        return Ok(SyncConfig::default());
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    parse_config(&content).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}
