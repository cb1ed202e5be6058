//! CLI commands

pub mod context;
pub mod run;
pub mod single;
pub mod style;
pub mod window;

use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use async_trait::async_trait;
use nightly_sync::progress::ProgressCallback;
use nightly_sync::types::{MergeAttempt, MergeOutcome};

/// Progress output for terminal runs
#[derive(Debug, Default)]
pub struct CliProgress {
    /// Print per-branch status lines before each attempt
    verbose: bool,
}

impl CliProgress {
    /// One line per finished attempt
    pub const fn compact() -> Self {
        Self { verbose: false }
    }

    /// Also announce each attempt before it starts
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        if self.verbose {
            println!("{}", message.muted());
        }
    }

    async fn on_attempt(&self, attempt: &MergeAttempt) {
        match &attempt.outcome {
            MergeOutcome::Success => println!(
                "  {} PR #{} ({})",
                check(),
                attempt.pr.accent(),
                attempt.branch
            ),
            MergeOutcome::Failure(reason) => println!(
                "  {} PR #{} ({}): {}",
                cross(),
                attempt.pr.accent(),
                attempt.branch,
                reason.to_string().warn()
            ),
        }
    }
}
