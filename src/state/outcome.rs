/// Download tasks and their outcomes
///
/// Outcomes are plain data: a failed download is recorded here instead of
/// being propagated, so one bad artifact never aborts its siblings.
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One artifact to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTask {
    /// Artifact URL
    pub url: String,

    /// Filename without extension; the extension is resolved from the response
    pub target_filename: String,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, target_filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target_filename: target_filename.into(),
        }
    }
}

/// Reasons a single artifact download failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactFetchError {
    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("download aborted: {0}")]
    Aborted(String),
}

/// How a download task resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Artifact written to `path`
    Success { bytes_written: u64, path: PathBuf },

    /// An artifact for this entry already existed at `path`
    Skipped { path: PathBuf },

    /// Download failed; nothing was written
    Failure(ArtifactFetchError),
}

/// Result of one download task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub task: DownloadTask,
    pub status: DownloadStatus,
}

impl DownloadOutcome {
    pub fn success(task: DownloadTask, bytes_written: u64, path: PathBuf) -> Self {
        Self {
            task,
            status: DownloadStatus::Success {
                bytes_written,
                path,
            },
        }
    }

    pub fn skipped(task: DownloadTask, path: PathBuf) -> Self {
        Self {
            task,
            status: DownloadStatus::Skipped { path },
        }
    }

    pub fn failure(task: DownloadTask, reason: ArtifactFetchError) -> Self {
        Self {
            task,
            status: DownloadStatus::Failure(reason),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self.status {
            DownloadStatus::Success { .. } => OutcomeKind::Success,
            DownloadStatus::Skipped { .. } => OutcomeKind::Skipped,
            DownloadStatus::Failure(_) => OutcomeKind::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, DownloadStatus::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, DownloadStatus::Failure(_))
    }

    /// Bytes written to disk, zero unless the download succeeded
    pub fn bytes_written(&self) -> u64 {
        match self.status {
            DownloadStatus::Success { bytes_written, .. } => bytes_written,
            _ => 0,
        }
    }

    /// Local path of the artifact, if one exists
    pub fn path(&self) -> Option<&PathBuf> {
        match &self.status {
            DownloadStatus::Success { path, .. } | DownloadStatus::Skipped { path } => Some(path),
            DownloadStatus::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ArtifactFetchError> {
        match &self.status {
            DownloadStatus::Failure(e) => Some(e),
            _ => None,
        }
    }
}

/// Outcome category, as stored in the run ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    Skipped,
    Failure,
}

impl OutcomeKind {
    /// Converts the kind to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Failure => "failure",
        }
    }

    /// Parses a kind from a database string representation
    ///
    /// Returns None if the string doesn't match any known kind.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "skipped" => Some(Self::Skipped),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::Skipped => "Skipped",
            Self::Failure => "Failure",
        };
        write!(f, "{}", name)
    }
}
