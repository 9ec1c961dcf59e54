//! Dataset trait and store error types

use crate::store::Record;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for the harvested-record dataset
///
/// The dataset is keyed by URL and first-writer-wins: appending a record
/// whose URL is already present leaves the stored row untouched.
pub trait Dataset {
    /// Returns the set of URLs already present in the dataset
    ///
    /// Loaded once at run start and folded into the run's seen-set so
    /// previously harvested pages are never fetched again.
    fn existing_keys(&self) -> StoreResult<HashSet<String>>;

    /// Appends a batch of records inside one transaction
    ///
    /// Records whose URL is already present are skipped. Returns how many
    /// rows were actually inserted.
    fn append(&mut self, records: &[Record]) -> StoreResult<usize>;

    /// Reads every record, ordered by URL
    fn read_all(&self) -> StoreResult<Vec<Record>>;

    /// Number of records in the dataset
    fn count(&self) -> StoreResult<u64>;

    /// Number of records with no extracted content
    fn count_blank(&self) -> StoreResult<u64>;
}
