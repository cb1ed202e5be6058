//! Run command - merge every relevant testing branch for the current window

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{CHECK, Stylize, arrow, hyperlink};
use anstream::{eprintln, println};
use dialoguer::Confirm;
use nightly_sync::config::NotifyKind;
use nightly_sync::error::{Error, Result};
use nightly_sync::progress::{NoProgress, ProgressCallback};
use nightly_sync::report::{compare_link, render_report, render_report_json};
use nightly_sync::sync::{SyncPlan, execute_sync, plan_sync};
use nightly_sync::types::Report;
use std::process::ExitCode;
use tracing::warn;

/// Options for the run command
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunOptions {
    /// Show what would be merged without touching the checkout
    pub dry_run: bool,
    /// Preview plan and prompt for confirmation before merging
    pub confirm: bool,
    /// Print the report (or the dry-run plan) as JSON, keeping stdout
    /// free of anything else
    pub json: bool,
    /// Skip fetching the downstream remote
    pub no_fetch: bool,
    /// Announce each attempt before it starts
    pub verbose: bool,
}

/// Run the batch pipeline
///
/// Always produces a report once planning succeeds, even if every merge
/// fails; delivery problems are logged, not returned.
pub async fn run_batch(ctx: &CommandContext, options: RunOptions) -> Result<ExitCode> {
    // =========================================================================
    // Phase 1: PLAN
    // =========================================================================

    if !options.no_fetch {
        ctx.fetch().await?;
    }

    let quiet = options.json;
    let upstream = ctx.upstream()?;
    let plan = plan_sync(&ctx.repo, upstream.as_ref(), &ctx.sync).await?;
    if !quiet {
        print_plan(ctx, &plan);
    }

    if options.dry_run {
        if quiet {
            let json = serde_json::to_string_pretty(&plan)
                .map_err(|e| Error::Internal(format!("failed to serialize plan: {e}")))?;
            println!("{json}");
        } else {
            println!("{}", "Dry run complete".muted());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if options.confirm && !plan.is_empty() {
        if !Confirm::new()
            .with_prompt("Proceed with merge?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            eprintln!("{}", "Aborted".muted());
            return Ok(ExitCode::SUCCESS);
        }
        eprintln!();
    }

    // =========================================================================
    // Phase 2: EXECUTE
    // =========================================================================

    if !quiet && !plan.is_empty() {
        println!(
            "{} {}",
            "Merging".emphasis(),
            format!("{} branch(es)...", plan.relevant.len()).accent()
        );
    }

    let cli_progress = if options.verbose {
        CliProgress::verbose()
    } else {
        CliProgress::compact()
    };
    let progress: &dyn ProgressCallback = if quiet { &NoProgress } else { &cli_progress };
    let report = execute_sync(&ctx.repo, &plan, &ctx.sync, progress).await;

    // =========================================================================
    // Phase 3: REPORT
    // =========================================================================

    let text = render_report(&report, &ctx.report_style());
    if quiet && ctx.config.notify.kind == NotifyKind::Stdout {
        // stdout carries the JSON report
        eprintln!("{text}");
    } else {
        deliver_report(ctx, &text).await;
    }

    if quiet {
        println!("{}", render_report_json(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(ExitCode::SUCCESS)
}

/// Hand the rendered report to the configured notifier, logging failures
async fn deliver_report(ctx: &CommandContext, text: &str) {
    let result = match ctx.notifier() {
        Ok(notifier) => notifier.notify(text).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(error = %e, "report delivery failed");
        eprintln!("{}", format!("⚠️  Failed to deliver report: {e}").warn());
    }
}

/// Print the plan: window, extraction counts, and per-branch decisions
fn print_plan(ctx: &CommandContext, plan: &SyncPlan) {
    println!(
        "{} {}",
        "Version window:".emphasis(),
        plan.window.to_string().accent()
    );

    if plan.window.is_empty() {
        println!("  {}", "Marker unchanged, nothing to do".muted());
        println!();
        return;
    }

    let extraction = &plan.extraction;
    println!(
        "  {} upstream commit(s), {} PR(s)",
        extraction.commits_scanned,
        extraction.pr_numbers.len().accent()
    );
    if extraction.malformed > 0 {
        println!(
            "  {}",
            format!(
                "{} commit(s) with an unrecognised trailing reference were skipped",
                extraction.malformed
            )
            .warn()
        );
    }

    if plan.matched.is_empty() {
        println!("  {}", "No testing branches found".muted());
        println!();
        return;
    }

    for candidate in &plan.relevant {
        let link = compare_link(
            &ctx.sync.downstream_url,
            &ctx.sync.integration_branch,
            &candidate.branch,
        );
        println!(
            "  {} {} PR #{}",
            arrow(),
            "merge".success(),
            hyperlink(&candidate.pr.to_string(), &link)
        );
    }
    for candidate in &plan.skipped {
        println!(
            "  {} {} PR #{} ({})",
            arrow(),
            "skip".muted(),
            candidate.pr,
            "only ignored files changed".muted()
        );
    }
    println!();
}

/// Print a one-line outcome summary
fn print_summary(report: &Report) {
    println!();
    if report.failures.is_empty() {
        println!(
            "{} {} merged",
            format!("{CHECK} Sync complete:").success(),
            report.successes.len().accent()
        );
    } else {
        println!(
            "{} {} merged, {} failed",
            "⚠️  Sync finished with failures:".warn(),
            report.successes.len().accent(),
            report.failures.len().warn()
        );
    }
}
