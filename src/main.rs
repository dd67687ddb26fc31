//! Port-knocking access-control daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                  KNOCKGATE                      │
//!                    │                                                 │
//!   UDP knocks       │  ┌──────────┐    ┌───────────┐    ┌─────────┐  │
//!   ─────────────────┼─▶│   net    │───▶│   knock   │───▶│  knock  │  │
//!   (decoy ports)    │  │ listener │    │  tracker  │    │  gate   │  │
//!                    │  └──────────┘    └───────────┘    └────┬────┘  │
//!                    │                                        │       │
//!                    │                                        ▼       │
//!   TCP connection   │  ┌──────────┐                   ┌───────────┐  │
//!   ─────────────────┼─▶│ service  │                   │ firewall  │──┼──▶ iptables
//!   (protected port) │  │protected │                   │controller │  │
//!                    │  └──────────┘                   └───────────┘  │
//!                    │                                                 │
//!                    │  Cross-cutting: config, lifecycle, observability │
//!                    └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use knockgate::config::{load_config, validate_config, KnockConfig};
use knockgate::firewall::IptablesController;
use knockgate::lifecycle::spawn_signal_handler;
use knockgate::server::KnockServer;

#[derive(Parser)]
#[command(name = "knockgate")]
#[command(about = "Port-knocking access-control daemon", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated knock ports (overrides config file).
    #[arg(long)]
    sequence: Option<String>,

    /// Protected service port (overrides config file).
    #[arg(long)]
    protected_port: Option<u16>,

    /// Seconds allowed to complete the sequence (overrides config file).
    #[arg(long)]
    window: Option<f64>,

    /// Bind address for decoy and protected sockets (overrides config file).
    #[arg(long)]
    bind: Option<String>,
}

fn parse_sequence(raw: &str) -> Result<Vec<u16>, String> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<u16>()
                .map_err(|_| format!("invalid port {:?} in sequence", part.trim()))
        })
        .collect()
}

fn build_config(cli: &Cli) -> Result<KnockConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => KnockConfig::default(),
    };

    if let Some(raw) = &cli.sequence {
        config.sequence = parse_sequence(raw)?;
    }
    if let Some(port) = cli.protected_port {
        config.protected_port = port;
    }
    if let Some(window) = cli.window {
        config.window_secs = window;
    }
    if let Some(bind) = &cli.bind {
        config.bind_address = bind.clone();
    }

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err("configuration validation failed".into());
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    knockgate::observability::init_logging();

    tracing::info!("knockgate v0.1.0 starting");

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    tracing::info!(
        sequence = ?config.sequence,
        protected_port = config.protected_port,
        window_secs = config.window_secs,
        bind_address = %config.bind_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => knockgate::observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let firewall = Arc::new(IptablesController::new());
    let server = KnockServer::new(config, firewall);
    spawn_signal_handler(server.shutdown_handle());

    server.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
