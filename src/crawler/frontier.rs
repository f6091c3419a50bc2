//! Frontier walker: the stopping rule of the catch-up loop
//!
//! The listing is sorted newest update first, so the first entry older than
//! the checkpoint marks the frontier exactly. The walker consumes pages in
//! order and emits only the entries in front of that point.

use crate::feed::{ArxivId, EntryRecord, FeedPage};
use crate::state::Checkpoint;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An entry older than the checkpoint was reached
    ReachedCheckpoint,

    /// A page came back with fewer entries than requested
    FeedExhausted,

    /// The caller asked to stop paging
    Cancelled,
}

/// Walker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Scanning,
    Stopped(StopReason),
}

/// Counters collected while walking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Pages consumed
    pub pages: u64,

    /// Entries examined, including the one that ended the walk
    pub entries_seen: u64,

    /// Entries emitted for download
    pub emitted: u64,

    /// Entries skipped because they could not be parsed
    pub malformed: u64,

    /// Entries skipped because they were already emitted this run
    pub duplicates: u64,

    /// Newest update time among emitted entries
    pub newest_emitted: Option<DateTime<Utc>>,
}

/// Applies the checkpoint stopping rule across successive pages
#[derive(Debug)]
pub struct FrontierWalker {
    checkpoint: Checkpoint,
    page_size: usize,
    state: WalkState,
    seen: HashSet<ArxivId>,
    stats: WalkStats,
}

impl FrontierWalker {
    /// Creates a walker for pages requested with `page_size` entries
    pub fn new(checkpoint: Checkpoint, page_size: usize) -> Self {
        Self {
            checkpoint,
            page_size,
            state: WalkState::Scanning,
            seen: HashSet::new(),
            stats: WalkStats::default(),
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, WalkState::Stopped(_))
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.state {
            WalkState::Stopped(reason) => Some(reason),
            WalkState::Scanning => None,
        }
    }

    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Stops the walk on behalf of the caller; a finished walk keeps its reason
    pub fn cancel(&mut self) {
        if self.state == WalkState::Scanning {
            self.state = WalkState::Stopped(StopReason::Cancelled);
        }
    }

    /// Consumes the next page and returns the entries to download, in page order
    ///
    /// # Transitions
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | entry older than checkpoint | Stopped; entry and rest of page dropped |
    /// | malformed entry | skipped with a warning, walk continues |
    /// | entry already emitted this run | skipped, walk continues |
    /// | page shorter than page size | Stopped after the page |
    ///
    /// A stopped walker ignores further pages.
    pub fn consume_page(&mut self, page: &FeedPage) -> Vec<EntryRecord> {
        if self.is_stopped() {
            return Vec::new();
        }

        self.stats.pages += 1;
        let mut emitted = Vec::new();

        for item in page.entries() {
            self.stats.entries_seen += 1;

            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping entry at offset {}: {}", page.offset(), e);
                    self.stats.malformed += 1;
                    continue;
                }
            };

            if !self.checkpoint.admits(entry.updated_at) {
                tracing::debug!(
                    "Entry {} updated {} is older than checkpoint {}; frontier reached",
                    entry.id,
                    entry.updated_at,
                    self.checkpoint
                );
                self.state = WalkState::Stopped(StopReason::ReachedCheckpoint);
                return emitted;
            }

            if !self.seen.insert(entry.id.clone()) {
                tracing::debug!("Entry {} already emitted this run", entry.id);
                self.stats.duplicates += 1;
                continue;
            }

            self.stats.emitted += 1;
            self.stats.newest_emitted = Some(match self.stats.newest_emitted {
                Some(newest) => newest.max(entry.updated_at),
                None => entry.updated_at,
            });
            emitted.push(entry.clone());
        }

        if page.len() < self.page_size {
            tracing::debug!(
                "Page at offset {} returned {} of {} entries; feed exhausted",
                page.offset(),
                page.len(),
                self.page_size
            );
            self.state = WalkState::Stopped(StopReason::FeedExhausted);
        }

        emitted
    }
}
