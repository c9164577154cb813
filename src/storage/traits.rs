//! Storage traits and error types

use crate::state::SeenSet;
use crate::storage::HistoryRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("History file is missing the '{0}' column")]
    MissingColumn(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only history of accepted discoveries
pub trait HistoryStore {
    /// Loads every persisted reference (and its identity) into a fresh seen set
    ///
    /// Returns an empty set when nothing has been persisted yet.
    fn load(&self) -> StorageResult<SeenSet>;

    /// Durably appends one record
    ///
    /// The record must survive a crash that happens right after this returns.
    fn append(&mut self, record: &HistoryRecord) -> StorageResult<()>;

    /// Reads all well-formed records back
    fn records(&self) -> StorageResult<Vec<HistoryRecord>>;
}
