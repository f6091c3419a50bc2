//! Checkpoint timestamps
use crate::CatchupError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Boundary between already-downloaded history and the frontier
///
/// An entry whose update time is at or after the checkpoint belongs to the
/// frontier; anything strictly earlier has been downloaded by a prior run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checkpoint(DateTime<Utc>);

impl Checkpoint {
    /// Creates a checkpoint at the given instant
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Returns the checkpoint instant
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns true if an entry updated at `updated_at` is new since this checkpoint
    pub fn admits(&self, updated_at: DateTime<Utc>) -> bool {
        updated_at >= self.0
    }

    /// Parses a checkpoint from user input
    ///
    /// Accepts RFC 3339 (`2023-08-14T17:00:00Z`), a naive `YYYY-MM-DDTHH:MM:SS`
    /// taken as UTC, or a bare date meaning midnight UTC.
    pub fn parse(input: &str) -> crate::Result<Self> {
        let input = input.trim();

        if let Ok(at) = DateTime::parse_from_rfc3339(input) {
            return Ok(Self(at.with_timezone(&Utc)));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self(naive.and_utc()));
        }

        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| CatchupError::InvalidCheckpoint(input.to_string()))
    }

    /// Converts the checkpoint to its database string representation
    pub fn to_db_string(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl FromStr for Checkpoint {
    type Err = CatchupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl From<DateTime<Utc>> for Checkpoint {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}
