//! Graceful-shutdown orchestrator (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                   ORCHESTRATOR                   │
//!                        │                                                  │
//!     Client Request     │  ┌──────────┐    ┌──────────┐    ┌────────────┐  │
//!     ───────────────────┼─▶│ ingress  │───▶│ workers  │───▶│ processor  │  │
//!                        │  │ (axum)   │    │ pool +   │    │            │  │
//!     Client Response    │  │          │◀───│ queue    │◀───│            │  │
//!     ◀──────────────────┼──│          │    └──────────┘    └─────┬──────┘  │
//!                        │  └──────────┘                          │ reads   │
//!                        │                  ┌──────────┐    ┌─────▼──────┐  │
//!                        │                  │background│───▶│   cache    │  │
//!                        │                  │ periodic │    │            │  │
//!                        │                  └──────────┘    └────────────┘  │
//!                        │                                                  │
//!                        │  ┌────────────────────────────────────────────┐  │
//!                        │  │ lifecycle: start order, root signal,       │  │
//!                        │  │ ordered shutdown, resource handle          │  │
//!                        │  └────────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use shutdown_orchestrator::config::{load_config, OrchestratorConfig};
use shutdown_orchestrator::lifecycle::signals::wait_for_shutdown_signal;
use shutdown_orchestrator::observability::{logging, metrics};
use shutdown_orchestrator::{Components, Lifecycle};

#[derive(Parser)]
#[command(name = "shutdown-orchestrator")]
#[command(about = "Worker pool service with ordered, deadline-bounded shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "ORCHESTRATOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => OrchestratorConfig::default(),
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        pool_size = config.pool.size,
        request_timeout_ms = config.pool.request_timeout_ms,
        shutdown_deadline_ms = config.shutdown.deadline_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let deadline = config.shutdown.deadline();
    let components = Components::from_config(&config);
    let lifecycle = Lifecycle::new(config, components, tracing::info_span!("orchestrator"));

    if let Err(e) = lifecycle.start().await {
        tracing::error!(error = %e, "Failed to start");
        return ExitCode::FAILURE;
    }

    match wait_for_shutdown_signal().await {
        Ok(signal) => tracing::info!(signal, "Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for signals, shutting down"),
    }

    if let Err(e) = lifecycle.stop(deadline).await {
        tracing::error!(error = %e, "Shutdown error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Stopped successfully");
    ExitCode::SUCCESS
}
