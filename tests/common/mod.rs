//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use task_service::config::ServiceConfig;
use task_service::lifecycle::{self, Shutdown};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// A running service on an ephemeral port.
pub struct TestService {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Trigger graceful shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Start the service with its store file at `db_path`.
pub async fn start_service(db_path: &Path) -> TestService {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.store.path = db_path.display().to_string();

    let prepared = lifecycle::prepare(config).await.unwrap();
    let addr = prepared.local_addr;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        prepared.server.run(prepared.listener, rx).await.unwrap();
    });

    TestService {
        addr,
        db_path: db_path.to_path_buf(),
        shutdown,
        handle,
    }
}

/// Start the service on a fresh store inside a temporary directory.
///
/// Keep the returned `TempDir` alive for the duration of the test.
#[allow(dead_code)]
pub async fn start_fresh() -> (TestService, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let service = start_service(&dir.path().join("db.json")).await;
    (service, dir)
}
