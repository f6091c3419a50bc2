//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::output::RunSummary;
use crate::state::{Checkpoint, DownloadOutcome, OutcomeKind};
use crate::storage::{DownloadRecord, RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid stored value: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for run ledger backends
pub trait Storage {
    // ===== Run Management =====

    /// Records the start of a run
    ///
    /// # Arguments
    ///
    /// * `category` - Category being caught up
    /// * `checkpoint` - Checkpoint the run walks back to
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(
        &mut self,
        category: &str,
        checkpoint: Checkpoint,
        config_hash: &str,
    ) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run finished with its final status, counts and next checkpoint
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
        next_checkpoint: Option<Checkpoint>,
    ) -> StorageResult<()>;

    /// Checkpoint left by the most recent completed run of `category`
    fn latest_checkpoint(&self, category: &str) -> StorageResult<Option<Checkpoint>>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    // ===== Download Records =====

    /// Records the outcomes of a run in one transaction
    fn record_outcomes(&mut self, run_id: i64, outcomes: &[DownloadOutcome]) -> StorageResult<()>;

    /// Gets the download records of a run, in recording order
    fn get_run_downloads(&self, run_id: i64) -> StorageResult<Vec<DownloadRecord>>;

    // ===== Statistics =====

    /// Counts runs grouped by status
    fn count_runs_by_status(&self) -> StorageResult<HashMap<RunStatus, u64>>;

    /// Counts recorded downloads grouped by outcome
    fn count_downloads_by_status(&self) -> StorageResult<HashMap<OutcomeKind, u64>>;

    /// Total bytes written by successful downloads
    fn total_bytes_written(&self) -> StorageResult<u64>;
}
