//! Dataset export and reporting
//!
//! This module handles:
//! - Exporting the harvested dataset to CSV
//! - Summarizing harvest progress from the dataset and checkpoint

pub mod stats;

pub use stats::{load_statistics, print_statistics, DatasetStatistics};

use crate::store::Dataset;
use csv::WriterBuilder;
use std::path::Path;
use thiserror::Error;

/// Errors raised while exporting or summarizing the dataset
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for export operations
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Exports every record in the dataset to a CSV file
///
/// Columns are written in `url, title, subtitle, body` order under a header
/// row, blank records included. Rows are ordered by URL. Returns the number
/// of data rows written.
///
/// # Arguments
///
/// * `dataset` - The dataset to export
/// * `path` - Destination file, truncated if it already exists
pub fn export_csv(dataset: &dyn Dataset, path: &Path) -> ExportResult<u64> {
    let records = dataset.read_all()?;

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(["url", "title", "subtitle", "body"])?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(records.len() as u64)
}
