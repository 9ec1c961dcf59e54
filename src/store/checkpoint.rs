//! Page checkpoint persistence
//!
//! The checkpoint records the highest listing page whose links have been
//! fully enumerated, so the next run can start at the page after it. It is
//! deliberately forgiving: a missing, unreadable, or foreign checkpoint
//! degrades to "start from the beginning" rather than failing the run,
//! because the dataset's URL keys make re-harvesting a set of no-ops.

use crate::store::traits::StoreResult;
use crate::store::CHECKPOINT_FILE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    last_page: u32,
    /// Fingerprint of the catalog this checkpoint belongs to. Absent in
    /// files written by older versions; those are accepted as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    catalog: Option<String>,
}

/// Reads and writes the page checkpoint file
pub struct CheckpointStore {
    path: PathBuf,
    fingerprint: String,
}

impl CheckpointStore {
    /// Creates a checkpoint store rooted in the given data directory
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Directory the checkpoint file lives in
    /// * `fingerprint` - Catalog fingerprint stamped into saved checkpoints
    pub fn new(data_dir: &Path, fingerprint: &str) -> Self {
        Self {
            path: data_dir.join(CHECKPOINT_FILE),
            fingerprint: fingerprint.to_string(),
        }
    }

    /// Loads the last fully enumerated page number
    ///
    /// Never fails: every problem (no file, unreadable JSON, a checkpoint
    /// stamped for a different catalog) resolves to 0, meaning the next
    /// run starts at page 1.
    pub fn load(&self) -> u32 {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => {
                debug!("No checkpoint at {}; starting from page 1", self.path.display());
                return 0;
            }
        };

        let parsed: CheckpointFile = match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    "Checkpoint at {} is unreadable ({}); starting from page 1",
                    self.path.display(),
                    e
                );
                return 0;
            }
        };

        if let Some(catalog) = &parsed.catalog {
            if *catalog != self.fingerprint {
                warn!(
                    "Checkpoint at {} belongs to a different catalog; starting from page 1",
                    self.path.display()
                );
                return 0;
            }
        }

        parsed.last_page
    }

    /// Persists `page` as the last fully enumerated page
    ///
    /// Written to a temporary file and renamed into place so a crash
    /// mid-write leaves the previous checkpoint intact.
    pub fn save(&self, page: u32) -> StoreResult<()> {
        let checkpoint = CheckpointFile {
            last_page: page,
            catalog: Some(self.fingerprint.clone()),
        };
        let json = serde_json::to_string(&checkpoint)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Deletes the checkpoint so the next run starts from page 1
    ///
    /// The dataset is untouched; already harvested URLs will be skipped
    /// by the seen-set as usual.
    pub fn reset(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
