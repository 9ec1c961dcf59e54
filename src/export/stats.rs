//! Dataset statistics
//!
//! Summarizes harvest progress: how far into the catalog the checkpoint
//! has walked, how many records are stored, and how many of those are
//! blanks left behind by failed detail extractions.

use crate::export::ExportResult;
use crate::store::{CheckpointStore, Dataset};

/// Snapshot of harvest progress
#[derive(Debug, Clone)]
pub struct DatasetStatistics {
    /// Total number of records in the dataset
    pub total_records: u64,

    /// Records whose extracted fields are all empty
    pub blank_records: u64,

    /// Last listing page enumerated by any run
    pub last_page: u32,
}

/// Loads statistics from the dataset and checkpoint
///
/// # Arguments
///
/// * `dataset` - The dataset to query
/// * `checkpoint` - The page checkpoint for the same data directory
///
/// # Returns
///
/// * `Ok(DatasetStatistics)` - Successfully loaded statistics
/// * `Err(ExportError)` - Failed to query the dataset
pub fn load_statistics(
    dataset: &dyn Dataset,
    checkpoint: &CheckpointStore,
) -> ExportResult<DatasetStatistics> {
    let total_records = dataset.count()?;
    let blank_records = dataset.count_blank()?;
    let last_page = checkpoint.load();

    Ok(DatasetStatistics {
        total_records,
        blank_records,
        last_page,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `max_pages` - The configured catalog size, for coverage percentages
pub fn print_statistics(stats: &DatasetStatistics, max_pages: u32) {
    println!("=== Harvest Statistics ===\n");

    println!("Catalog:");
    println!(
        "  Last page enumerated: {} of {}",
        stats.last_page, max_pages
    );
    let coverage = if max_pages > 0 {
        (stats.last_page as f64 / max_pages as f64) * 100.0
    } else {
        0.0
    };
    println!("  Coverage: {:.1}%", coverage);
    println!();

    println!("Records:");
    println!("  Total stored: {}", stats.total_records);
    println!("  Blank (failed extractions): {}", stats.blank_records);
    if stats.total_records > 0 {
        let usable = stats.total_records - stats.blank_records;
        let rate = (usable as f64 / stats.total_records as f64) * 100.0;
        println!("  Usable: {} ({:.1}%)", usable, rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Record, SqliteDataset};
    use tempfile::tempdir;

    #[test]
    fn test_load_statistics_counts_records_and_blanks() {
        let dir = tempdir().unwrap();
        let mut dataset = SqliteDataset::new_in_memory().unwrap();
        dataset
            .append(&[
                Record {
                    url: "https://example.com/en/glossary/kaizen".to_string(),
                    title: "Kaizen".to_string(),
                    subtitle: "Continuous improvement".to_string(),
                    body: "A philosophy of incremental change.".to_string(),
                },
                Record::blank("https://example.com/en/glossary/muda"),
            ])
            .unwrap();

        let checkpoint = CheckpointStore::new(dir.path(), "fp");
        checkpoint.save(3).unwrap();

        let stats = load_statistics(&dataset, &checkpoint).unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.blank_records, 1);
        assert_eq!(stats.last_page, 3);
    }

    #[test]
    fn test_load_statistics_on_an_empty_dataset() {
        let dir = tempdir().unwrap();
        let dataset = SqliteDataset::new_in_memory().unwrap();
        let checkpoint = CheckpointStore::new(dir.path(), "fp");

        let stats = load_statistics(&dataset, &checkpoint).unwrap();
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.blank_records, 0);
        assert_eq!(stats.last_page, 0);
    }
}
