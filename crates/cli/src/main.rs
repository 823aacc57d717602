//! Weather gatherer CLI
//!
//! Loads the station list, runs one polling cycle and exits. Exit code 2
//! signals a configuration-class failure (rejected credentials), so a
//! scheduler can page instead of silently retrying.

mod settings;

use std::sync::Arc;

use clap::Parser;
use storage::SqliteObservationStore;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::AppConfig;

/// Weather observation gatherer
#[derive(Parser)]
#[command(name = "weather-gatherer")]
#[command(author, version, about = "Polls weather stations and stores normalized observations", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "gatherer.toml")]
    config: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Fetch and postprocess but skip all persistence
    #[arg(long)]
    dry_run: bool,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(cli.verbose)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load(&cli.config)?;
    if cli.dry_run {
        config.gatherer.dry_run = true;
    }
    if config.gatherer.dry_run {
        // A dry run must not leave a database file behind
        config.database.path = ":memory:".to_string();
    }

    if config.stations.is_empty() {
        warn!(config = %cli.config, "No stations configured, nothing to poll");
        return Ok(());
    }

    let pool = storage::create_pool(&config.database)?;
    let store = Arc::new(SqliteObservationStore::new(Arc::new(pool)));
    let gatherer = gatherer::Gatherer::new(config.gatherer, store)?;

    let report = gatherer.run(&config.stations).await;
    let summary = report.summary();
    info!(%summary, run = %report.run_id, "Cycle complete");

    for (outcome, failure) in report.failures() {
        warn!(
            station = %outcome.station_id,
            provider = %outcome.provider,
            %failure,
            "Station failed this cycle"
        );
    }

    if report.has_auth_failures() {
        error!("At least one station was rejected by its provider, check credentials");
        std::process::exit(2);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_scales_with_verbosity() {
        assert_eq!(log_filter_from_verbosity(0), "info");
        assert_eq!(log_filter_from_verbosity(1), "debug");
        assert_eq!(log_filter_from_verbosity(2), "trace");
        assert_eq!(log_filter_from_verbosity(9), "trace");
    }
}
