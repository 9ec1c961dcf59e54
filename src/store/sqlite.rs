//! SQLite dataset implementation
//!
//! This module provides the SQLite-backed implementation of the Dataset
//! trait. Batches are written inside a single transaction with
//! `ON CONFLICT DO NOTHING`, so re-appending an already harvested URL is
//! a no-op and flush cost scales with the batch, not with the dataset.

use crate::store::schema::initialize_schema;
use crate::store::traits::{Dataset, StoreResult};
use crate::store::Record;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

/// SQLite dataset backend
pub struct SqliteDataset {
    conn: Connection,
}

impl SqliteDataset {
    /// Opens (or creates) the dataset at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteDataset)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better durability/performance balance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory dataset (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Dataset for SqliteDataset {
    fn existing_keys(&self) -> StoreResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM records")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = HashSet::new();
        for row in rows {
            keys.insert(row?);
        }
        Ok(keys)
    }

    fn append(&mut self, records: &[Record]) -> StoreResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO records (url, title, subtitle, body)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(url) DO NOTHING",
            )?;
            for record in records {
                inserted +=
                    stmt.execute(params![record.url, record.title, record.subtitle, record.body])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn read_all(&self) -> StoreResult<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, title, subtitle, body FROM records ORDER BY url")?;
        let rows = stmt.query_map([], |row| {
            Ok(Record {
                url: row.get(0)?,
                title: row.get(1)?,
                subtitle: row.get(2)?,
                body: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_blank(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE title = '' AND subtitle = '' AND body = ''",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
