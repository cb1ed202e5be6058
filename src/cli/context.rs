//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by the run, merge and window commands.

use crate::cli::style::{Stylize, check, spinner_style};
use indicatif::ProgressBar;
use nightly_sync::config::{SyncConfig, load_config};
use nightly_sync::error::Result;
use nightly_sync::git::GitRepository;
use nightly_sync::notify::{Notifier, create_notifier};
use nightly_sync::report::ReportStyle;
use nightly_sync::sync::SyncContext;
use nightly_sync::upstream::{UpstreamHistory, create_upstream};
use nightly_sync::vcs::VersionControl;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Shared context for CLI commands that work on the downstream checkout
///
/// This struct encapsulates the common setup:
/// - Opening the git repository
/// - Loading and validating the config
/// - Deriving the pipeline settings
///
/// The upstream backend and notifier are created on demand, since the
/// single-branch command needs neither.
pub struct CommandContext {
    /// The downstream checkout
    pub repo: GitRepository,
    /// Loaded configuration
    pub config: SyncConfig,
    /// Settings handed to the pipeline
    pub sync: SyncContext,
}

impl CommandContext {
    /// Create a new command context
    pub async fn new(path: &Path, config_path: Option<&Path>) -> Result<Self> {
        let repo = GitRepository::open(path).await?;
        let repo_root = repo.root().await?;

        let config = load_config(&repo_root, config_path)?;
        debug!(?config, "loaded config");
        let sync = SyncContext::from_config(&config);

        Ok(Self {
            repo,
            config,
            sync,
        })
    }

    /// Upstream history backend from the config
    pub fn upstream(&self) -> Result<Box<dyn UpstreamHistory>> {
        create_upstream(&self.config.upstream)
    }

    /// Report notifier from the config
    pub fn notifier(&self) -> Result<Box<dyn Notifier>> {
        create_notifier(&self.config.notify)
    }

    /// Text rendering settings from the config
    pub fn report_style(&self) -> ReportStyle {
        ReportStyle {
            integration_branch: self.config.integration_branch.clone(),
            recovery_command: self.config.report.recovery_command.clone(),
        }
    }

    /// Fetch the downstream remote behind a spinner
    pub async fn fetch(&self) -> Result<()> {
        let remote = &self.config.remote;
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!("Fetching from {}...", remote.emphasis()));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let result = self.repo.fetch(remote).await;

        match result {
            Ok(()) => {
                spinner.finish_with_message(format!(
                    "{} Fetched from {}",
                    check(),
                    remote.emphasis()
                ));
                Ok(())
            }
            Err(e) => {
                spinner.finish_and_clear();
                Err(e)
            }
        }
    }
}
