//! Crawl orchestrator - the paging loop
//!
//! This module ties the pieces of a catch-up run together:
//! - Requesting listing pages at increasing offsets
//! - Feeding each page through the frontier walker
//! - Submitting emitted entries to the download pool
//! - Draining the pool and reporting, including on fatal feed errors

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, ArtifactFetcher, ExtensionMap};
use crate::crawler::frontier::{FrontierWalker, StopReason};
use crate::crawler::pool::DownloadPool;
use crate::crawler::shutdown::SharedShutdown;
use crate::feed::{EntryRecord, FeedClient};
use crate::output::RunSummary;
use crate::state::{Checkpoint, DownloadOutcome, DownloadTask};
use crate::{CatchupError, ConfigError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Parameters of a single catch-up run
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub checkpoint: Checkpoint,
    pub category: String,
    pub page_size: usize,
    pub max_parallel_downloads: usize,
}

impl CrawlRequest {
    /// Builds a request from the feed and download sections of `config`
    pub fn from_config(config: &Config, checkpoint: Checkpoint) -> Self {
        Self {
            checkpoint,
            category: config.feed.category.clone(),
            page_size: config.feed.page_size as usize,
            max_parallel_downloads: config.download.max_parallel_downloads as usize,
        }
    }
}

/// Result of a run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub summary: RunSummary,

    /// One outcome per submitted task, in submission order
    pub outcomes: Vec<DownloadOutcome>,

    /// `None` when the run was aborted by a feed error
    pub stop_reason: Option<StopReason>,

    /// Newest update time among entries submitted for download
    pub newest_entry: Option<DateTime<Utc>>,
}

impl CrawlReport {
    /// Checkpoint to use for the next run
    ///
    /// Advances to the newest submitted entry only when the walk finished on
    /// its own and every download succeeded or was skipped. Otherwise the
    /// previous checkpoint is kept so nothing is missed next time.
    pub fn next_checkpoint(&self, previous: Checkpoint) -> Checkpoint {
        let walk_finished = matches!(
            self.stop_reason,
            Some(StopReason::ReachedCheckpoint) | Some(StopReason::FeedExhausted)
        );

        match self.newest_entry {
            Some(newest) if walk_finished && self.summary.failures == 0 => {
                Checkpoint::new(newest.max(previous.timestamp()))
            }
            _ => previous,
        }
    }

    /// Whether the run was cut short by a shutdown request
    pub fn was_cancelled(&self) -> bool {
        self.stop_reason == Some(StopReason::Cancelled)
    }
}

/// Drives a catch-up run from the listing API to files on disk
pub struct CrawlOrchestrator {
    feed: FeedClient,
    fetcher: Arc<ArtifactFetcher>,
    artifact_url: String,
    request_delay: Duration,
    shutdown: Option<SharedShutdown>,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator from the given parts
    pub fn new(
        feed: FeedClient,
        fetcher: ArtifactFetcher,
        artifact_url: impl Into<String>,
        request_delay: Duration,
    ) -> Self {
        Self {
            feed,
            fetcher: Arc::new(fetcher),
            artifact_url: artifact_url.into(),
            request_delay,
            shutdown: None,
        }
    }

    /// Builds the HTTP client, feed client, and fetcher described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.download.timeout_secs),
        )?;

        let api_url = Url::parse(&config.feed.api_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.feed.api_url, e)))?;

        let extensions = ExtensionMap::default().with_mappings(&config.download.extensions);
        let fetcher = ArtifactFetcher::new(client.clone(), &config.download.output_dir)
            .with_extensions(extensions)
            .with_skip_existing(config.download.skip_existing);

        Ok(Self::new(
            FeedClient::new(client, api_url),
            fetcher,
            config.download.artifact_url.clone(),
            Duration::from_millis(config.feed.request_delay_ms),
        ))
    }

    /// Lets `shutdown` stop the paging loop
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Builds the download task for an entry
    pub fn task_for(&self, entry: &EntryRecord) -> DownloadTask {
        DownloadTask::new(
            format!(
                "{}/{}",
                self.artifact_url.trim_end_matches('/'),
                entry.id.as_str()
            ),
            entry.id.file_stem(),
        )
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Sleeps for the request delay; returns early on shutdown
    async fn pause(&self) {
        if self.request_delay.is_zero() {
            return;
        }
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep(self.request_delay) => {}
                    _ = shutdown.wait_for_shutdown() => {}
                }
            }
            None => tokio::time::sleep(self.request_delay).await,
        }
    }

    /// Runs the paging loop until the walker stops, then drains all downloads
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The walk stopped at the checkpoint, at the end of
    ///   the feed, or on shutdown; every submitted task has an outcome
    /// * `Err(CatchupError::FeedQuery)` - A listing request failed; submitted
    ///   tasks were drained first and their report is attached
    pub async fn run(&self, request: &CrawlRequest) -> Result<CrawlReport> {
        tokio::fs::create_dir_all(self.fetcher.output_dir()).await?;

        // A zero page size would never produce a short page
        let page_size = request.page_size.max(1);

        tracing::info!(
            "Catching up cat:{} since {} (page size {}, {} parallel downloads)",
            request.category,
            request.checkpoint,
            page_size,
            request.max_parallel_downloads
        );

        let mut walker = FrontierWalker::new(request.checkpoint, page_size);
        let mut pool = DownloadPool::new(self.fetcher.clone(), request.max_parallel_downloads);
        let mut offset = 0usize;

        loop {
            if self.shutdown_requested() {
                tracing::info!("Shutdown requested; stopping at offset {}", offset);
                walker.cancel();
                break;
            }

            let page = match self
                .feed
                .query_page(&request.category, page_size, offset)
                .await
            {
                Ok(page) => page,
                Err(source) => {
                    tracing::error!("Listing query at offset {} failed: {}", offset, source);
                    let outcomes = pool.drain().await;
                    let partial = CrawlReport {
                        summary: RunSummary::from_parts(walker.stats(), &outcomes),
                        outcomes,
                        stop_reason: None,
                        newest_entry: walker.stats().newest_emitted,
                    };
                    return Err(CatchupError::FeedQuery {
                        offset,
                        source,
                        partial: Box::new(partial),
                    });
                }
            };

            let emitted = walker.consume_page(&page);
            tracing::info!(
                "Page at offset {}: {} entries, {} new",
                offset,
                page.len(),
                emitted.len()
            );

            for entry in &emitted {
                tracing::debug!("Queueing {} ({})", entry.id, entry.resource_link);
                pool.submit(self.task_for(entry));
            }

            if walker.is_stopped() {
                break;
            }

            offset += page_size;
            self.pause().await;
        }

        tracing::info!("Waiting for {} downloads to finish", pool.submitted());
        let outcomes = pool.drain().await;

        let report = CrawlReport {
            summary: RunSummary::from_parts(walker.stats(), &outcomes),
            outcomes,
            stop_reason: walker.stop_reason(),
            newest_entry: walker.stats().newest_emitted,
        };

        tracing::info!(
            "Run finished ({:?}): {} succeeded, {} failed, {} skipped",
            report.stop_reason,
            report.summary.successes,
            report.summary.failures,
            report.summary.skipped
        );

        Ok(report)
    }
}
