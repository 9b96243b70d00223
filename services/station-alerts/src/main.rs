//! Station Alerts CLI
//!
//! Command-line interface for the live station alert dashboard.

use std::path::PathBuf;

use clap::Parser;
use station_alerts::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "station-alerts")]
#[command(about = "Live security alert dashboard for a monitoring station")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Station identifier to join (overrides config file)
    #[arg(long)]
    station_id: Option<String>,

    /// Backend URL (overrides config file)
    #[arg(long)]
    backend_url: Option<String>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, station_id={:?}, backend_url={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.station_id,
        args.backend_url,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(station_id) = args.station_id {
        config.station.id = station_id;
    }
    if let Some(backend_url) = args.backend_url {
        config.backend.url = backend_url;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting station alerts service");
    tracing::debug!(
        "Station: {} at ({}, {}), backend: {}",
        config.station.id,
        config.station.latitude,
        config.station.longitude,
        config.backend.url
    );

    station_alerts::run(config).await?;

    Ok(())
}
