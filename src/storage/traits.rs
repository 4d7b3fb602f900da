//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{CmsLabel, JobState, OutcomeStatus, ProcessingOutcome};
use crate::storage::RunRecord;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt row {row}: {message}")]
    CorruptRow { row: i64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for recovery store implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `resume_index` - First input row this run processes
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, resume_index: usize) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records a run's terminal state with a finish timestamp
    fn finish_run(&mut self, run_id: i64, state: JobState) -> StorageResult<()>;

    // ===== Outcomes =====

    /// Writes outcomes in one transaction, replacing rows with the same input index
    fn upsert_outcomes(&mut self, run_id: i64, outcomes: &[ProcessingOutcome])
        -> StorageResult<()>;

    /// Loads every stored outcome ordered by input row
    fn load_outcomes(&self) -> StorageResult<Vec<ProcessingOutcome>>;

    /// Deletes every stored outcome (a fresh run starts from row 0)
    fn clear_outcomes(&mut self) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts stored outcomes
    fn count_outcomes(&self) -> StorageResult<u64>;

    /// Counts stored outcomes per label, failed records included
    fn count_by_label(&self) -> StorageResult<HashMap<CmsLabel, u64>>;

    /// Counts stored outcomes per status
    fn count_by_status(&self) -> StorageResult<HashMap<OutcomeStatus, u64>>;
}
