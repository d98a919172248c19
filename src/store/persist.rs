//! Snapshot persistence.
//!
//! # Responsibilities
//! - Own the store file: a single task performs every write
//! - Apply snapshots in the order they were submitted
//! - Acknowledge each submission once its bytes (or a newer snapshot's)
//!   are on disk
//!
//! # Design Decisions
//! - Writes go to `<file>.tmp` and are renamed over the target, so a crash
//!   mid-write never leaves a truncated store
//! - Snapshots queued behind a running write are coalesced: only the newest
//!   is written and every waiter gets its result
//! - Failures are logged and handed back to the caller, never swallowed

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};

use crate::observability::metrics;
use crate::store::StoreError;

struct WriteJob {
    snapshot: Vec<u8>,
    done: oneshot::Sender<io::Result<()>>,
}

/// Handle to the single writer task for one store file.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<WriteJob>,
}

/// Acknowledgement for one submitted snapshot.
#[derive(Debug)]
pub struct PendingWrite {
    rx: oneshot::Receiver<io::Result<()>>,
}

impl PendingWrite {
    /// Wait until the snapshot is durable.
    pub async fn wait(self) -> Result<(), StoreError> {
        match self.rx.await {
            Ok(result) => result.map_err(StoreError::Persistence),
            Err(_) => Err(StoreError::WriterClosed),
        }
    }
}

impl SnapshotWriter {
    /// Spawn the writer task. Must be called inside a Tokio runtime.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(path, rx));
        Self { tx }
    }

    /// Queue a serialized snapshot. Queue order is write order.
    pub fn submit(&self, snapshot: Vec<u8>) -> Result<PendingWrite, StoreError> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(WriteJob { snapshot, done })
            .map_err(|_| StoreError::WriterClosed)?;
        Ok(PendingWrite { rx })
    }
}

async fn run_writer(path: PathBuf, mut rx: mpsc::UnboundedReceiver<WriteJob>) {
    tracing::debug!(path = %path.display(), "Snapshot writer started");

    while let Some(first) = rx.recv().await {
        let mut waiters = vec![first.done];
        let mut snapshot = first.snapshot;
        while let Ok(next) = rx.try_recv() {
            waiters.push(next.done);
            snapshot = next.snapshot;
        }

        let start = Instant::now();
        match write_atomically(&path, &snapshot).await {
            Ok(()) => {
                metrics::record_persist("ok", start);
                tracing::trace!(
                    path = %path.display(),
                    bytes = snapshot.len(),
                    coalesced = waiters.len(),
                    "Store persisted"
                );
                for done in waiters {
                    let _ = done.send(Ok(()));
                }
            }
            Err(e) => {
                metrics::record_persist("error", start);
                tracing::error!(path = %path.display(), error = %e, "Failed to persist store");
                for done in waiters {
                    let _ = done.send(Err(io::Error::new(e.kind(), e.to_string())));
                }
            }
        }
    }

    tracing::debug!(path = %path.display(), "Snapshot writer stopped");
}

/// Replace `path` with `bytes` via a temporary sibling file.
pub(crate) async fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path() {
        assert_eq!(temp_path(Path::new("data/db.json")), PathBuf::from("data/db.json.tmp"));
        assert_eq!(temp_path(Path::new("db.json")), PathBuf::from("db.json.tmp"));
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/db.json");

        write_atomically(&path, b"{}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_last_submission_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let writer = SnapshotWriter::spawn(path.clone());

        let pending: Vec<_> = (0..50)
            .map(|i| writer.submit(format!("{{\"n\":{i}}}").into_bytes()).unwrap())
            .collect();
        for p in pending {
            p.wait().await.unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"n\":49}");
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the target file makes the rename fail
        let path = dir.path().join("db.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let writer = SnapshotWriter::spawn(path);
        let err = writer.submit(b"{}".to_vec()).unwrap().wait().await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
    }
}
