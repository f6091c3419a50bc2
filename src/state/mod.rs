//! State module for a single catch-up run
//!
//! # Components
//!
//! - `Checkpoint`: the point in time everything older than which is already downloaded
//! - `DownloadTask`: one artifact to fetch
//! - `DownloadOutcome`: how a task resolved (success, skip or isolated failure)

mod checkpoint;
mod outcome;

// Re-export main types
pub use checkpoint::Checkpoint;
pub use outcome::{ArtifactFetchError, DownloadOutcome, DownloadStatus, DownloadTask, OutcomeKind};
