//! Merge command - merge one PR's testing branch

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross, hyperlink};
use anstream::println;
use nightly_sync::error::Result;
use nightly_sync::report::recovery_line;
use nightly_sync::sync::{SingleOutcome, run_single};
use nightly_sync::types::{MergeOutcome, PrNumber};
use std::process::ExitCode;

/// Options for the merge command
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Leave a successful merge applied for the caller to push
    pub keep: bool,
    /// Skip fetching the downstream remote
    pub no_fetch: bool,
}

/// Run the single-branch merge
///
/// Exit status is success unless the merge was attempted and failed.
pub async fn run_merge(
    ctx: &CommandContext,
    pr: PrNumber,
    options: MergeOptions,
) -> Result<ExitCode> {
    if !options.no_fetch {
        ctx.fetch().await?;
    }

    let progress = CliProgress::compact();
    let outcome = run_single(&ctx.repo, &ctx.sync, pr, options.keep, &progress).await?;

    match &outcome {
        SingleOutcome::Merged(attempt) => {
            println!(
                "{} Merged {} into {}",
                check(),
                hyperlink(&format!("PR #{}", attempt.pr), &attempt.compare_link),
                ctx.sync.integration_branch.accent()
            );
            if options.keep {
                println!(
                    "{}",
                    "   The merge is left applied; review and push it.".muted()
                );
            }
        }
        SingleOutcome::Failed(attempt) => {
            let reason = match &attempt.outcome {
                MergeOutcome::Failure(reason) => reason.to_string(),
                MergeOutcome::Success => String::new(),
            };
            println!(
                "{} Could not merge {}: {}",
                cross(),
                hyperlink(&format!("PR #{}", attempt.pr), &attempt.compare_link),
                reason.warn()
            );
            println!(
                "{}",
                format!(
                    "   Resolve by hand: {}",
                    recovery_line(&ctx.config.report.recovery_command, attempt)
                )
                .muted()
            );
        }
        SingleOutcome::Irrelevant(candidate) => {
            println!(
                "{} {} only changes ignored files, nothing to merge",
                check(),
                candidate.branch.accent()
            );
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
