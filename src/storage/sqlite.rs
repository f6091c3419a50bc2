//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::output::RunSummary;
use crate::state::{Checkpoint, DownloadOutcome, OutcomeKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{DownloadRecord, RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const RUN_COLUMNS: &str = "id, category, checkpoint, started_at, finished_at, config_hash, status, \
     next_checkpoint, pages_scanned, submitted, successes, failures, skipped";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the ledger database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CatchupError)` - Failed to open database
    pub fn new(path: &Path) -> crate::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn parse_checkpoint(idx: usize, raw: &str) -> rusqlite::Result<Checkpoint> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| Checkpoint::new(ts.with_timezone(&Utc)))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let checkpoint: String = row.get(2)?;
    let next_checkpoint: Option<String> = row.get(7)?;
    let status: String = row.get(6)?;

    Ok(RunRecord {
        id: row.get(0)?,
        category: row.get(1)?,
        checkpoint: parse_checkpoint(2, &checkpoint)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        config_hash: row.get(5)?,
        status: RunStatus::from_db_string(&status).unwrap_or(RunStatus::Running),
        next_checkpoint: next_checkpoint
            .as_deref()
            .map(|raw| parse_checkpoint(7, raw))
            .transpose()?,
        pages_scanned: row.get::<_, i64>(8)? as u64,
        submitted: row.get::<_, i64>(9)? as u64,
        successes: row.get::<_, i64>(10)? as u64,
        failures: row.get::<_, i64>(11)? as u64,
        skipped: row.get::<_, i64>(12)? as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        category: &str,
        checkpoint: Checkpoint,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (category, checkpoint, started_at, config_hash, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                category,
                checkpoint.to_db_string(),
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        stmt.query_row(params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        Ok(stmt.query_row([], run_from_row).optional()?)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
        next_checkpoint: Option<Checkpoint>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, next_checkpoint = ?3,
                 pages_scanned = ?4, submitted = ?5, successes = ?6, failures = ?7, skipped = ?8
             WHERE id = ?9",
            params![
                status.to_db_string(),
                now,
                next_checkpoint.map(|c| c.to_db_string()),
                summary.pages_scanned as i64,
                summary.submitted as i64,
                summary.successes as i64,
                summary.failures as i64,
                summary.skipped as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_checkpoint(&self, category: &str) -> StorageResult<Option<Checkpoint>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT next_checkpoint FROM runs
                 WHERE category = ?1 AND status = ?2 AND next_checkpoint IS NOT NULL
                 ORDER BY id DESC LIMIT 1",
                params![category, RunStatus::Completed.to_db_string()],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| {
            Checkpoint::parse(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
        })
        .transpose()
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    // ===== Download Records =====

    fn record_outcomes(&mut self, run_id: i64, outcomes: &[DownloadOutcome]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO downloads
                     (run_id, url, filename, status, bytes_written, error_message, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for outcome in outcomes {
                let filename = outcome
                    .path()
                    .and_then(|p| p.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| outcome.task.target_filename.clone());

                stmt.execute(params![
                    run_id,
                    outcome.task.url,
                    filename,
                    outcome.kind().to_db_string(),
                    outcome.bytes_written() as i64,
                    outcome.error().map(|e| e.to_string()),
                    now
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Recorded {} outcomes for run {}", outcomes.len(), run_id);
        Ok(())
    }

    fn get_run_downloads(&self, run_id: i64) -> StorageResult<Vec<DownloadRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, url, filename, status, bytes_written, error_message, recorded_at
             FROM downloads WHERE run_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            let status: String = row.get(3)?;
            Ok(DownloadRecord {
                run_id: row.get(0)?,
                url: row.get(1)?,
                filename: row.get(2)?,
                status: OutcomeKind::from_db_string(&status).unwrap_or(OutcomeKind::Failure),
                bytes_written: row.get::<_, i64>(4)? as u64,
                error_message: row.get(5)?,
                recorded_at: row.get(6)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ===== Statistics =====

    fn count_runs_by_status(&self) -> StorageResult<HashMap<RunStatus, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM runs GROUP BY status")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((status, count))
        })?;

        for row in rows {
            let (status, count) = row?;
            if let Some(status) = RunStatus::from_db_string(&status) {
                counts.insert(status, count as u64);
            }
        }

        Ok(counts)
    }

    fn count_downloads_by_status(&self) -> StorageResult<HashMap<OutcomeKind, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM downloads GROUP BY status")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((status, count))
        })?;

        for row in rows {
            let (status, count) = row?;
            if let Some(kind) = OutcomeKind::from_db_string(&status) {
                counts.insert(kind, count as u64);
            }
        }

        Ok(counts)
    }

    fn total_bytes_written(&self) -> StorageResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(bytes_written), 0) FROM downloads WHERE status = ?1",
            params![OutcomeKind::Success.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }
}
