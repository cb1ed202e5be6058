//! nightly-sync CLI

mod cli;

use clap::{Parser, Subcommand};
use cli::context::CommandContext;
use cli::run::{RunOptions, run_batch};
use cli::single::{MergeOptions, run_merge};
use cli::style::Stylize;
use cli::window::run_window;
use nightly_sync::error::Result;
use nightly_sync::types::PrNumber;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "nightly-sync")]
#[command(version)]
#[command(about = "Merge upstream PR testing branches into a nightly integration branch")]
struct Cli {
    /// Path to the downstream repository
    #[arg(short, long, global = true, default_value = ".")]
    path: PathBuf,

    /// Config file (default: <repo>/.nightly-sync.toml, then the user config)
    #[arg(short, long, global = true, env = "NIGHTLY_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every relevant testing branch for the current version window
    Run {
        /// Show what would be merged without touching the checkout
        #[arg(long)]
        dry_run: bool,

        /// Preview plan and prompt for confirmation before merging
        #[arg(long)]
        confirm: bool,

        /// Print the report as JSON on stdout; human output moves to stderr
        #[arg(long)]
        json: bool,

        /// Do not fetch the remote first
        #[arg(long)]
        no_fetch: bool,
    },

    /// Merge the testing branch of a single upstream PR
    Merge {
        /// Upstream PR number
        pr: PrNumber,

        /// Leave a successful merge applied instead of restoring the branch
        #[arg(long)]
        keep: bool,

        /// Do not fetch the remote first
        #[arg(long)]
        no_fetch: bool,
    },

    /// Show the version window the next run would search
    Window {
        /// Do not fetch the remote first
        #[arg(long)]
        no_fetch: bool,
    },
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`.
fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().with_target(false).json().with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let ctx = CommandContext::new(&cli.path, cli.config.as_deref()).await?;

    match cli.command {
        Commands::Run {
            dry_run,
            confirm,
            json,
            no_fetch,
        } => {
            run_batch(
                &ctx,
                RunOptions {
                    dry_run,
                    confirm,
                    json,
                    no_fetch,
                    verbose: cli.verbose,
                },
            )
            .await
        }
        Commands::Merge { pr, keep, no_fetch } => {
            run_merge(&ctx, pr, MergeOptions { keep, no_fetch }).await
        }
        Commands::Window { no_fetch } => {
            run_window(&ctx, no_fetch).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.log_json, level);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            anstream::eprintln!("{} {e}", "Error:".error());
            ExitCode::FAILURE
        }
    }
}
