//! Document store subsystem.
//!
//! # Data Flow
//! ```text
//! Handler calls store operation
//!     → document.rs (lock state, mutate collection, serialize snapshot)
//!     → persist.rs (single writer: tmp file + rename, in submission order)
//!     → acknowledgement back to the caller
//!
//! Startup:
//!     store file → document.rs (parse or start empty) → in-memory Database
//! ```
//!
//! # Design Decisions
//! - The store is the only owner of records; reads return copies
//! - Every mutation is persisted as a full snapshot before it is reported
//! - Collections are created implicitly on first insert
//! - A missing or unreadable file means "start empty", never a fatal error

pub mod document;
pub mod persist;
pub mod record;

use thiserror::Error;
use uuid::Uuid;

pub use document::DocumentStore;
pub use record::{Database, Filter, NewRecord, Record, RecordPatch};

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Record {id} not found in table {table}")]
    RecordNotFound { table: String, id: Uuid },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to persist store: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Snapshot writer is no longer running")]
    WriterClosed,
}

impl StoreError {
    /// Unknown table or unknown record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::TableNotFound(_) | StoreError::RecordNotFound { .. })
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::TableNotFound(_) => "table_not_found",
            StoreError::RecordNotFound { .. } => "record_not_found",
            StoreError::Serialize(_) => "serialize",
            StoreError::Persistence(_) => "persistence",
            StoreError::WriterClosed => "writer_closed",
        }
    }
}
