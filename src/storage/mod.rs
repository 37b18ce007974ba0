//! Storage layer - embedded SQLite database shared by history and settings
//!
//! Each bucket is one table of `key -> value` rows. Every operation runs in its
//! own short transaction; SQLite serializes them internally.

pub mod history;
pub mod settings;

use std::path::Path;
use std::rc::Rc;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::constants::{HISTORY_BUCKET, SETTINGS_BUCKET};

pub use history::{HistoryKeys, HistoryStore};
pub use settings::{Settings, SettingsStore};

/// Errors raised by the history and settings stores
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no entry `{key}` in bucket `{bucket}`")]
    NotFound { bucket: &'static str, key: String },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Handle to the embedded database, opened once and cloned into each store.
///
/// Not `Send`: the stores live on the app actor and are never touched from a
/// background task.
#[derive(Clone)]
pub struct Database {
    conn: Rc<Connection>,
}

impl Database {
    /// Open (or create) the database file and make sure both buckets exist
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Private database that disappears with the handle
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        for bucket in [HISTORY_BUCKET, SETTINGS_BUCKET] {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {bucket} (
                   key TEXT PRIMARY KEY,
                   value BLOB NOT NULL
                 );"
            ))?;
        }
        Ok(Database {
            conn: Rc::new(conn),
        })
    }

    /// Every row of a bucket, in no particular order
    pub(crate) fn read_all(&self, bucket: &'static str) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = {
            let mut stmt = tx.prepare(&format!("SELECT key, value FROM {bucket}"))?;
            let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            mapped.collect::<Result<Vec<(String, Vec<u8>)>, _>>()?
        };
        tx.commit()?;
        Ok(rows)
    }

    pub(crate) fn read(&self, bucket: &'static str, key: &str) -> StorageResult<Vec<u8>> {
        let tx = self.conn.unchecked_transaction()?;
        let value: Option<Vec<u8>> = tx
            .query_row(
                &format!("SELECT value FROM {bucket} WHERE key = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        tx.commit()?;

        value.ok_or_else(|| StorageError::NotFound {
            bucket,
            key: key.to_string(),
        })
    }

    /// Insert or overwrite one row
    pub(crate) fn put(&self, bucket: &'static str, key: &str, value: &[u8]) -> StorageResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO {bucket} (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value"
            ),
            params![key, value],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove rows by key; missing keys are not an error
    pub(crate) fn remove(&self, bucket: &'static str, keys: &[String]) -> StorageResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare(&format!("DELETE FROM {bucket} WHERE key = ?1"))?;
            for key in keys {
                removed += stmt.execute(params![key])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }
}
