//! Persistence for harvested records and run progress
//!
//! Two artifacts live in the data directory:
//!
//! - `records.db` - SQLite dataset of harvested records, keyed by URL
//! - `page_checkpoint.json` - highest fully enumerated listing page
//!
//! The dataset is append-only in spirit: a URL, once written, is never
//! updated. The checkpoint is a tiny JSON file rewritten atomically.

mod checkpoint;
mod schema;
mod sqlite;
mod traits;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use checkpoint::CheckpointStore;
pub use sqlite::SqliteDataset;
pub use traits::{Dataset, StoreError, StoreResult};

/// File name of the SQLite dataset inside the data directory
pub const DATASET_FILE: &str = "records.db";

/// File name of the page checkpoint inside the data directory
pub const CHECKPOINT_FILE: &str = "page_checkpoint.json";

/// Location of the dataset file under a data directory
pub fn dataset_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATASET_FILE)
}

/// One harvested catalog entry
///
/// The URL is the identity; the three content fields may be empty when the
/// detail page lacked the element or extraction failed outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

impl Record {
    /// A record with no extracted content, kept so the URL is not refetched
    pub fn blank(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            subtitle: String::new(),
            body: String::new(),
        }
    }

    /// True when every content field is empty
    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.subtitle.is_empty() && self.body.is_empty()
    }
}
