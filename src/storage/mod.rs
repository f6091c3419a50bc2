//! Storage module for the run ledger
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run tracking and checkpoint resolution
//! - Per-download outcome records

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::{Checkpoint, OutcomeKind};

/// Represents a catch-up run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub category: String,

    /// Checkpoint the run walked back to
    pub checkpoint: Checkpoint,

    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,

    /// Checkpoint for the following run, set when the run finishes
    pub next_checkpoint: Option<Checkpoint>,

    pub pages_scanned: u64,
    pub submitted: u64,
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
}

/// Represents one recorded download outcome
#[derive(Debug, Clone)]
pub struct DownloadRecord {
    pub run_id: i64,
    pub url: String,
    pub filename: String,
    pub status: OutcomeKind,
    pub bytes_written: u64,
    pub error_message: Option<String>,
    pub recorded_at: String,
}

/// Status of a catch-up run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
