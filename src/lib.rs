//! arxiv-catchup: incremental catch-up downloader for arXiv listings
//!
//! This crate pages through the arXiv listing API newest-first, stops at the
//! first entry older than a checkpoint, and downloads the e-print artifact of
//! every newer entry through a bounded pool of concurrent workers.

pub mod config;
pub mod crawler;
pub mod feed;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for catch-up operations
#[derive(Debug, Error)]
pub enum CatchupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A listing request failed; the run was aborted after draining the
    /// downloads already submitted. `partial` holds what was collected.
    #[error("Feed query failed at offset {offset}: {source}")]
    FeedQuery {
        offset: usize,
        source: feed::FeedError,
        partial: Box<crawler::CrawlReport>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Invalid checkpoint '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidCheckpoint(String),

    #[error("No checkpoint recorded for category '{0}'; pass --since")]
    MissingCheckpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while normalizing an arXiv entry identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Identifier is empty")]
    Empty,

    #[error("No 'abs' segment in entry URL: {0}")]
    MissingAbsSegment(String),

    #[error("Invalid character in identifier: {0}")]
    InvalidCharacter(String),

    #[error("Too many path segments in identifier: {0}")]
    TooManySegments(String),
}

/// Result type alias for catch-up operations
pub type Result<T> = std::result::Result<T, CatchupError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlReport, CrawlRequest};
pub use feed::{ArxivId, EntryRecord, FeedPage};
pub use state::{Checkpoint, DownloadOutcome, DownloadStatus, DownloadTask};
