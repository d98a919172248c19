//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Open the document store (loads the file, starts the writer)
//! - Compile the route table and build the HTTP server
//! - Bind the listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - Fail fast: config, route or bind errors are fatal
//! - A missing or corrupt store file is not an error (starts empty)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{validate_config, ConfigError, ServiceConfig};
use crate::http::HttpServer;
use crate::routing::PatternError;
use crate::store::DocumentStore;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid route table: {0}")]
    Routes(#[from] PatternError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A service that is bound and ready to run.
pub struct Prepared {
    pub server: HttpServer,
    pub listener: TcpListener,
    pub local_addr: SocketAddr,
    pub store: Arc<DocumentStore>,
}

/// Bring every subsystem up in dependency order.
pub async fn prepare(config: ServiceConfig) -> Result<Prepared, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let store = Arc::new(DocumentStore::open(&config.store.path).await);

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, store.clone())?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address: bind_address,
        source,
    })?;

    tracing::info!(address = %local_addr, "Listening for connections");

    Ok(Prepared {
        server,
        listener,
        local_addr,
        store,
    })
}
