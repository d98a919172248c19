//! Task service.
//!
//! A small HTTP service managing task records in a flat-file document store.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ ┌──────────┐   ┌────────────┐   ┌─────────────┐
//!                     │   http   │──▶│  routing   │──▶│ http::tasks │
//!                     │  server  │   │ dispatcher │   │  handlers   │
//!                     └──────────┘   └────────────┘   └──────┬──────┘
//!                                                            │
//!                                                            ▼
//!                                                   ┌─────────────────┐
//!                                                   │ store::document │
//!                                                   └────────┬────────┘
//!                                                            │ snapshot
//!                                                            ▼
//!                                                   ┌─────────────────┐
//!                                                   │ store::persist  │──▶ db.json
//!                                                   └─────────────────┘
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;

use task_service::config::{load_config, ServiceConfig};
use task_service::lifecycle::{self, Shutdown};
use task_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "task-service")]
#[command(about = "HTTP task service backed by a JSON document store", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the store file path
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(db) = cli.db {
        config.store.path = db;
    }

    logging::init_logging(&config.observability);

    tracing::info!("task-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_path = %config.store.path,
        request_timeout_secs = config.timeouts.request_secs,
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

    let prepared = lifecycle::prepare(config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::signals::wait_for_signal().await;
        trigger.trigger();
    });

    prepared.server.run(prepared.listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
