//! End-of-run summary

use crate::crawler::WalkStats;
use crate::state::{DownloadOutcome, OutcomeKind};

/// Counts reported at the end of every run, aborted runs included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Listing pages fetched and walked
    pub pages_scanned: u64,

    /// Entries examined by the walker
    pub entries_seen: u64,

    /// Download tasks submitted
    pub submitted: u64,

    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,

    /// Entries dropped because they could not be parsed
    pub malformed: u64,

    /// Entries dropped because they appeared twice in the listing
    pub duplicates: u64,

    /// Bytes written by successful downloads
    pub bytes_written: u64,
}

impl RunSummary {
    /// Builds a summary from walker counters and drained outcomes
    pub fn from_parts(stats: &WalkStats, outcomes: &[DownloadOutcome]) -> Self {
        let mut summary = Self {
            pages_scanned: stats.pages,
            entries_seen: stats.entries_seen,
            submitted: outcomes.len() as u64,
            malformed: stats.malformed,
            duplicates: stats.duplicates,
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome.kind() {
                OutcomeKind::Success => summary.successes += 1,
                OutcomeKind::Skipped => summary.skipped += 1,
                OutcomeKind::Failure => summary.failures += 1,
            }
            summary.bytes_written += outcome.bytes_written();
        }

        summary
    }
}

/// Prints a run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Catch-up Summary ===\n");
    println!("  Pages scanned: {}", summary.pages_scanned);
    println!("  Entries seen: {}", summary.entries_seen);
    println!("  Downloads submitted: {}", summary.submitted);
    println!("  Successes: {}", summary.successes);
    println!("  Failures: {}", summary.failures);

    if summary.skipped > 0 {
        println!("  Skipped (already present): {}", summary.skipped);
    }
    if summary.malformed > 0 {
        println!("  Malformed entries: {}", summary.malformed);
    }
    if summary.duplicates > 0 {
        println!("  Duplicate entries: {}", summary.duplicates);
    }

    println!("  Bytes written: {}", summary.bytes_written);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ArtifactFetchError, DownloadTask};
    use std::path::PathBuf;

    #[test]
    fn test_from_parts_counts_outcomes() {
        let stats = WalkStats {
            pages: 2,
            entries_seen: 5,
            emitted: 3,
            malformed: 1,
            duplicates: 0,
            newest_emitted: None,
        };
        let task = |n: &str| DownloadTask::new(format!("https://example.com/{}", n), n);
        let outcomes = vec![
            DownloadOutcome::success(task("a"), 10, PathBuf::from("a.pdf")),
            DownloadOutcome::failure(task("b"), ArtifactFetchError::HttpStatus(404)),
            DownloadOutcome::skipped(task("c"), PathBuf::from("c.tar")),
        ];

        let summary = RunSummary::from_parts(&stats, &outcomes);

        assert_eq!(summary.pages_scanned, 2);
        assert_eq!(summary.entries_seen, 5);
        assert_eq!(summary.submitted, 3);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.bytes_written, 10);
    }
}
