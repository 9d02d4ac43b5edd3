use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use munibid_sync::{Pipeline, SyncConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "munibid")]
#[command(about = "Municipal bid aggregation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every source adapter once and replace the persisted dataset.
    Sync,
    /// Serve the read-side JSON API.
    Serve,
    /// Run the pipeline on the configured cron schedule until interrupted.
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let summary = munibid_sync::run_sync_once_from_env().await?;
            println!(
                "sync complete: run_id={} records={} sources={} skipped={} review_dates={}",
                summary.run_id,
                summary.records,
                summary.sources_with_data,
                summary.sources_skipped,
                summary.dates_for_review,
            );
        }
        Commands::Serve => {
            munibid_web::serve_from_env().await?;
        }
        Commands::Schedule => {
            let mut config = SyncConfig::from_env();
            config.scheduler_enabled = true;
            let pipeline = Pipeline::new(config)?;
            let Some(mut scheduler) = pipeline.maybe_build_scheduler().await? else {
                bail!("scheduler not built despite being requested");
            };
            scheduler.start().await?;
            info!("scheduler running, ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            scheduler.shutdown().await?;
        }
    }

    Ok(())
}
