//! Output module for run summaries and ledger statistics
//!
//! This module handles:
//! - The summary printed at the end of every run
//! - Statistics over all recorded runs (`--stats`)

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, CatchupStatistics};
pub use summary::{print_run_summary, RunSummary};
