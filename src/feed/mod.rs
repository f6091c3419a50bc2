//! Listing feed module
//!
//! This module covers everything between the listing API and the frontier walker:
//! - Querying one page of the listing, newest update first
//! - Parsing the Atom response into entry records
//! - Normalizing entry identifiers

mod client;
mod identifier;
mod parser;

pub use client::FeedClient;
pub use identifier::ArxivId;
pub use parser::parse_feed;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from a listing request. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing request returned HTTP {0}")]
    Status(u16),

    #[error("failed to parse feed: {0}")]
    Xml(#[from] quick_xml::errors::serialize::DeError),

    #[error("listing API reported an error: {0}")]
    Api(String),
}

/// An entry that could not be turned into an [`EntryRecord`]
///
/// The walker skips these with a warning; they never stop the walk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed entry {raw_id:?}: {reason}")]
pub struct MalformedEntryError {
    /// The raw `<id>` text, if the entry had one
    pub raw_id: Option<String>,

    /// What was wrong with it
    pub reason: String,
}

/// One listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Normalized identifier
    pub id: ArxivId,

    /// Last update time reported by the feed
    pub updated_at: DateTime<Utc>,

    /// Canonical abstract-page link
    pub resource_link: String,
}

/// One page of listing results, in server order (newest update first)
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    offset: usize,
    entries: Vec<Result<EntryRecord, MalformedEntryError>>,
}

impl FeedPage {
    /// Creates a page from parsed entries
    pub fn new(offset: usize, entries: Vec<Result<EntryRecord, MalformedEntryError>>) -> Self {
        Self { offset, entries }
    }

    /// Creates a page containing only well-formed records
    pub fn from_records(offset: usize, records: Vec<EntryRecord>) -> Self {
        Self::new(offset, records.into_iter().map(Ok).collect())
    }

    /// Offset this page was requested at
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of entries on the page, malformed ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in server order
    pub fn entries(&self) -> impl Iterator<Item = &Result<EntryRecord, MalformedEntryError>> {
        self.entries.iter()
    }
}
