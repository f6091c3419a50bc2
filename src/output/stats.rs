//! Statistics from the run ledger
//!
//! This module provides functionality for extracting and displaying
//! catch-up statistics from the storage layer.

use crate::state::OutcomeKind;
use crate::storage::{RunRecord, RunStatus, Storage};
use crate::Result;
use std::collections::HashMap;

/// Number of runs listed by `--stats`
const RECENT_RUN_LIMIT: usize = 10;

/// Ledger statistics summary
#[derive(Debug, Clone)]
pub struct CatchupStatistics {
    /// Count of runs by status
    pub runs_by_status: HashMap<RunStatus, u64>,

    /// Count of recorded downloads by outcome
    pub downloads_by_status: HashMap<OutcomeKind, u64>,

    /// Bytes written by successful downloads across all runs
    pub total_bytes: u64,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

impl CatchupStatistics {
    pub fn total_runs(&self) -> u64 {
        self.runs_by_status.values().sum()
    }

    pub fn total_downloads(&self) -> u64 {
        self.downloads_by_status.values().sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatchupStatistics)` - Successfully loaded statistics
/// * `Err(CatchupError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CatchupStatistics> {
    Ok(CatchupStatistics {
        runs_by_status: storage.count_runs_by_status()?,
        downloads_by_status: storage.count_downloads_by_status()?,
        total_bytes: storage.total_bytes_written()?,
        recent_runs: storage.recent_runs(RECENT_RUN_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatchupStatistics) {
    println!("=== Catch-up Statistics ===\n");

    println!("Runs ({}):", stats.total_runs());
    for status in [
        RunStatus::Completed,
        RunStatus::Interrupted,
        RunStatus::Failed,
        RunStatus::Running,
    ] {
        if let Some(count) = stats.runs_by_status.get(&status) {
            println!("  {}: {}", status.to_db_string(), count);
        }
    }
    println!();

    let total_downloads = stats.total_downloads();
    println!("Downloads ({}):", total_downloads);
    for kind in [OutcomeKind::Success, OutcomeKind::Skipped, OutcomeKind::Failure] {
        let count = stats.downloads_by_status.get(&kind).copied().unwrap_or(0);
        let percentage = if total_downloads > 0 {
            (count as f64 / total_downloads as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", kind, count, percentage);
    }
    println!("  Bytes written: {}", stats.total_bytes);
    println!();

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            let next = run
                .next_checkpoint
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  #{} {} {} since {} -> {} ({} ok, {} failed, {} skipped)",
                run.id,
                run.category,
                run.status.to_db_string(),
                run.checkpoint,
                next,
                run.successes,
                run.failures,
                run.skipped
            );
        }
    }
}
