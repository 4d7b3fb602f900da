//! Storage module for the recovery store
//!
//! This module handles all database operations for a batch run, including:
//! - SQLite database initialization and schema management
//! - Run tracking (start, resume index, terminal state)
//! - Per-record outcome persistence, keyed by input row
//! - Aggregate counts for statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::model::JobState;
use crate::ScoutError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(ScoutError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScoutError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    SqliteStorage::new(path)
}

/// Represents a batch run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    /// First input row the run processed
    pub resume_index: usize,
    pub state: JobState,
}
