//! Prune command - delete rides that have been gone for a while.

use anyhow::{Context, Result};
use clap::Args;
use ridewatch_store::{Config, MAX_RETENTION_DAYS, RideStore};
use tracing::info;

use super::{emit, load_config};
use crate::Cli;

/// Arguments for the prune command.
#[derive(Args)]
pub struct PruneArgs {
    /// Delete rides gone for more than this many days; defaults to the configured retention.
    #[arg(
        long,
        short,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RETENTION_DAYS))
    )]
    pub days: Option<u32>,
}

/// Runs the prune command.
pub async fn run(args: &PruneArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let days = args.days.unwrap_or(config.retention_days);

    let db_path = config.database_path();
    let store = RideStore::open(&db_path)
        .with_context(|| format!("Failed to open ride database {}", db_path.display()))?;

    let deleted = store.prune(Config::retention_for(days))?;
    info!(deleted, days, "Prune complete");

    let value = serde_json::json!({ "deleted": deleted, "days": days });
    emit(cli, &value, |_| {
        format!("Deleted {deleted} ride(s) gone for more than {days} day(s)")
    })
}
