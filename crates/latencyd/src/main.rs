//! latencyd - per-region latency/uptime aggregation daemon
//!
//! Loads the telemetry dataset once, then serves region aggregates over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use latency_common::TelemetryStore;
use latencyd::config::{Config, CONFIG_PATH};
use latencyd::server::{self, AppState};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "latencyd", version, about = "Serve per-region latency and uptime aggregates")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, env = "LATENCYD_CONFIG", default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Telemetry dataset (JSON array), overrides data.path
    #[arg(long)]
    data: Option<PathBuf>,

    /// Listen address, overrides server.bind_addr
    #[arg(long)]
    bind: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    info!("[BOOT] latencyd v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    config.apply_overrides(cli.data, cli.bind);
    config.validate().context("invalid configuration")?;

    // The dataset is required; never serve without it.
    let store = TelemetryStore::load(&config.data.path)
        .inspect_err(|e| error!("[FATAL] {}", e))
        .context("telemetry dataset could not be loaded")?;
    info!(
        "[BOOT] Dataset ready: {} records across {} regions",
        store.len(),
        store.regions().count()
    );

    let state = AppState::new(store, config.aggregation.default_threshold_ms)?;
    server::run(state, &config).await
}
