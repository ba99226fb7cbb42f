//! Chain watchdog (v1)
//!
//! Supervises a chain head listener and keeps it running across RPC
//! provider outages.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                          CHAIN WATCHDOG                           │
//!   │                                                                   │
//!   │  ┌──────────────┐  report_error   ┌──────────────┐               │
//!   │  │ BlockPoller  │────────────────▶│  classifier  │               │
//!   │  │  (listener)  │                 └──────┬───────┘               │
//!   │  └──────▲───────┘                        │ FailureSignal         │
//!   │         │ start/stop/recover             ▼                       │
//!   │         │                        ┌──────────────┐                │
//!   │         └────────────────────────│  Supervisor  │                │
//!   │                                  │  select! loop│                │
//!   │                                  └──┬────────┬──┘                │
//!   │                          spawn/cancel│        │arm/disarm         │
//!   │                                     ▼        ▼                    │
//!   │                         ┌──────────────┐ ┌────────────────┐      │
//!   │                         │RecoveryProbe │ │ScheduledReturn │      │
//!   │                         └──────┬───────┘ └────────────────┘      │
//!   │                                │ eth_blockNumber                  │
//!   │                                ▼                                  │
//!   │                  primary RPC ◀──▶ fallback RPC                    │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use chain_watchdog::config::{load_config, WatchdogConfig};
use chain_watchdog::lifecycle::{self, Shutdown};
use chain_watchdog::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "chain-watchdog")]
#[command(about = "Keeps a chain listener alive across RPC provider outages", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Supervise the listener until SIGINT/SIGTERM (default)
    Run,
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => WatchdogConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Run => run(config).await,
    }
}

async fn run(config: WatchdogConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&config.observability);

    tracing::info!("chain-watchdog v0.1.0 starting");
    tracing::info!(
        primary_url = %config.providers.primary_url,
        fallback_configured = config.providers.fallback_url.is_some(),
        poll_interval_ms = config.recovery.poll_interval_ms,
        success_threshold = config.recovery.success_threshold,
        failure_threshold = config.recovery.failure_threshold,
        return_to_primary_delay_secs = config.recovery.return_to_primary_delay_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let supervisor = lifecycle::build(&config)?;
    let shutdown = Shutdown::new();
    let running = tokio::spawn(supervisor.run(shutdown.subscribe()));

    shutdown.trigger_on_os_signal().await?;
    running.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
