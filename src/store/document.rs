//! Table-oriented document store.
//!
//! # Responsibilities
//! - Hold every collection in memory behind one lock
//! - Assign ids and lifecycle timestamps
//! - Apply partial updates, completion toggles, deletions and searches
//! - Hand a full snapshot to the writer after every mutation
//!
//! # Design Decisions
//! - Snapshots are queued while the lock is held, so the file always
//!   follows mutation order; the caller then awaits the write
//! - Lookups are linear scans by id (tables are small)
//! - Failed lookups leave state untouched and write nothing
//! - A failed write does not roll back the mutation it carried

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::observability::metrics;
use crate::store::persist::SnapshotWriter;
use crate::store::record::{Database, Filter, NewRecord, Record, RecordPatch};
use crate::store::StoreError;

/// The document store. Construct once at startup and share via `Arc`.
#[derive(Debug)]
pub struct DocumentStore {
    state: Mutex<Database>,
    writer: Option<SnapshotWriter>,
    path: Option<PathBuf>,
}

enum LoadOutcome {
    Loaded(Database),
    Missing,
    Unreadable,
}

impl DocumentStore {
    /// A store without a backing file.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(Database::new()),
            writer: None,
            path: None,
        }
    }

    /// Load the store from `path` and start its writer.
    ///
    /// A missing file starts empty and is created; an unreadable or
    /// malformed one starts empty and is replaced by the next mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let (database, create_file) = match load_database(&path) {
            LoadOutcome::Loaded(database) => {
                let records: usize = database.values().map(Vec::len).sum();
                tracing::info!(
                    path = %path.display(),
                    tables = database.len(),
                    records,
                    "Store loaded"
                );
                for (table, rows) in &database {
                    metrics::record_table_size(table, rows.len());
                }
                (database, false)
            }
            LoadOutcome::Missing => {
                tracing::info!(path = %path.display(), "No store file found, starting empty");
                (Database::new(), true)
            }
            LoadOutcome::Unreadable => (Database::new(), false),
        };

        let store = Self {
            state: Mutex::new(database),
            writer: Some(SnapshotWriter::spawn(path.clone())),
            path: Some(path),
        };

        if create_file {
            if let Err(e) = store.persist_current().await {
                tracing::warn!(error = %e, "Could not create store file");
            }
        }

        store
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the complete state.
    pub fn snapshot(&self) -> Database {
        self.lock().clone()
    }

    /// All records of `table`, empty if the table does not exist.
    pub fn find_all(&self, table: &str) -> Vec<Record> {
        self.lock().get(table).cloned().unwrap_or_default()
    }

    /// Records of `table` matching `filter`. An empty filter matches nothing.
    pub fn find_by_filter(&self, table: &str, filter: &Filter) -> Vec<Record> {
        if filter.is_empty() {
            return Vec::new();
        }

        self.lock()
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append a new record, creating the table if needed.
    ///
    /// On [`StoreError::Persistence`] the record is already in memory and
    /// will reach disk with the next successful write. The outcome is
    /// unknown to the caller, so a blind retry creates a duplicate.
    pub async fn create(&self, table: &str, fields: NewRecord) -> Result<Record, StoreError> {
        self.commit("create", table, |db| {
            let records = db.entry(table.to_string()).or_default();
            let mut id = Uuid::new_v4();
            while records.iter().any(|r| r.id == id) {
                id = Uuid::new_v4();
            }
            let record = Record::new(id, fields, Utc::now());
            records.push(record.clone());
            Ok(record)
        })
        .await
    }

    /// Replace the fields present in `patch`.
    pub async fn update(&self, table: &str, id: Uuid, patch: RecordPatch) -> Result<Record, StoreError> {
        self.commit("update", table, |db| {
            let record = locate(db, table, id)?;
            record.apply(patch, Utc::now());
            Ok(record.clone())
        })
        .await
    }

    /// Flip `completed_at` between null and now.
    pub async fn toggle_completion(&self, table: &str, id: Uuid) -> Result<Record, StoreError> {
        self.commit("toggle", table, |db| {
            let record = locate(db, table, id)?;
            record.toggle_completion(Utc::now());
            Ok(record.clone())
        })
        .await
    }

    /// Remove the record with `id`, returning it.
    pub async fn delete(&self, table: &str, id: Uuid) -> Result<Record, StoreError> {
        self.commit("delete", table, |db| {
            let records = db
                .get_mut(table)
                .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
            let index = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| StoreError::RecordNotFound {
                    table: table.to_string(),
                    id,
                })?;
            Ok(records.remove(index))
        })
        .await
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `mutate` under the lock, queue the resulting snapshot, then wait
    /// for it to reach disk.
    async fn commit<T, F>(&self, op: &'static str, table: &str, mutate: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Database) -> Result<T, StoreError>,
    {
        let queued = {
            let mut db = self.lock();
            mutate(&mut db).and_then(|value| {
                metrics::record_table_size(table, db.get(table).map_or(0, Vec::len));
                let pending = match &self.writer {
                    Some(writer) => Some(writer.submit(serde_json::to_vec(&*db)?)?),
                    None => None,
                };
                Ok((value, pending))
            })
        };

        let result = match queued {
            Ok((value, Some(pending))) => pending.wait().await.map(|()| value),
            Ok((value, None)) => Ok(value),
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => metrics::record_store_operation(op, "ok"),
            Err(e) => {
                metrics::record_store_operation(op, e.kind());
                if e.is_not_found() {
                    tracing::debug!(op, table, reason = %e, "Store lookup failed");
                } else {
                    tracing::error!(op, table, error = %e, "Store mutation not persisted");
                }
            }
        }

        result
    }

    async fn persist_current(&self) -> Result<(), StoreError> {
        let pending = {
            let db = self.lock();
            match &self.writer {
                Some(writer) => Some(writer.submit(serde_json::to_vec(&*db)?)?),
                None => None,
            }
        };

        match pending {
            Some(pending) => pending.wait().await,
            None => Ok(()),
        }
    }
}

fn locate<'a>(db: &'a mut Database, table: &str, id: Uuid) -> Result<&'a mut Record, StoreError> {
    db.get_mut(table)
        .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| StoreError::RecordNotFound {
            table: table.to_string(),
            id,
        })
}

fn load_database(path: &Path) -> LoadOutcome {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Missing,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read store file, starting empty");
            return LoadOutcome::Unreadable;
        }
    };

    match serde_json::from_str(&content) {
        Ok(database) => LoadOutcome::Loaded(database),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse store file, starting empty");
            LoadOutcome::Unreadable
        }
    }
}
