//! Window command - show the version window the next run would search

use crate::cli::context::CommandContext;
use crate::cli::style::Stylize;
use anstream::println;
use nightly_sync::error::Result;
use nightly_sync::sync::resolve_version_window;

/// Print the resolved `(old, new)` markers
pub async fn run_window(ctx: &CommandContext, no_fetch: bool) -> Result<()> {
    if !no_fetch {
        ctx.fetch().await?;
    }

    let window = resolve_version_window(
        &ctx.repo,
        &ctx.sync.integration_ref(),
        &ctx.sync.marker_file,
        ctx.sync.marker_delimiter,
    )
    .await?;

    println!("{} {}", "old:".emphasis(), window.old.accent());
    println!("{} {}", "new:".emphasis(), window.new.accent());
    if window.is_empty() {
        println!("{}", "Marker unchanged; a run would find no candidates.".muted());
    }
    Ok(())
}
