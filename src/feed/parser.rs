//! Atom parser for listing responses
//!
//! Only the fields the catch-up loop needs are extracted: the entry id, its
//! update time and its abstract-page link. Everything else is ignored.

use crate::feed::{ArxivId, EntryRecord, FeedError, FeedPage, MalformedEntryError};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;

/// Path fragment of the ids arXiv uses for in-band error entries
const API_ERROR_MARKER: &str = "/api/errors";

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    updated: Option<String>,
    summary: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Parses an Atom listing response into a [`FeedPage`]
///
/// Entries that lack an id or a parseable update time become
/// [`MalformedEntryError`]s in place, preserving page length and order.
///
/// # Arguments
///
/// * `xml` - The response body
/// * `offset` - The offset the page was requested at
///
/// # Returns
///
/// * `Ok(FeedPage)` - The parsed page
/// * `Err(FeedError::Xml)` - The body is not a feed document
/// * `Err(FeedError::Api)` - The feed is an arXiv error report
pub fn parse_feed(xml: &str, offset: usize) -> Result<FeedPage, FeedError> {
    let feed: AtomFeed = from_str(xml)?;

    if let Some(error) = feed
        .entries
        .iter()
        .find(|entry| entry.id.as_deref().is_some_and(|id| id.contains(API_ERROR_MARKER)))
    {
        let message = error
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(error.id.as_deref())
            .unwrap_or("unknown error")
            .to_string();
        return Err(FeedError::Api(message));
    }

    let entries = feed.entries.into_iter().map(to_record).collect();
    Ok(FeedPage::new(offset, entries))
}

fn to_record(entry: AtomEntry) -> Result<EntryRecord, MalformedEntryError> {
    let raw_id = entry.id.map(|id| id.trim().to_string());

    let malformed = |reason: String| MalformedEntryError {
        raw_id: raw_id.clone(),
        reason,
    };

    let id_text = raw_id
        .as_deref()
        .ok_or_else(|| malformed("missing <id>".to_string()))?;
    let id = ArxivId::from_entry_id(id_text).map_err(|e| malformed(e.to_string()))?;

    let updated_text = entry
        .updated
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| malformed("missing <updated>".to_string()))?;
    let updated_at = DateTime::parse_from_rfc3339(updated_text)
        .map_err(|e| malformed(format!("invalid <updated> '{}': {}", updated_text, e)))?
        .with_timezone(&Utc);

    // Prefer the alternate (abstract page) link; the id itself is that URL on arXiv
    let resource_link = entry
        .links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .and_then(|link| link.href.clone())
        .unwrap_or_else(|| id_text.to_string());

    Ok(EntryRecord {
        id,
        updated_at,
        resource_link,
    })
}
