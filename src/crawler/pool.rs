//! Bounded download pool
//!
//! This module handles:
//! - Global concurrency limiting of downloads via a semaphore
//! - Keeping every submitted task so the pool can be drained completely
//! - Turning a crashed worker into a recorded failure instead of a lost task

use crate::crawler::fetcher::ArtifactFetcher;
use crate::state::{ArtifactFetchError, DownloadOutcome, DownloadTask};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Runs downloads with at most `max_parallel` in flight
///
/// Submission never waits: tasks queue on the semaphore, so paging can
/// continue while downloads run. [`DownloadPool::drain`] is the barrier that
/// waits for all of them.
pub struct DownloadPool {
    /// Global semaphore for limiting concurrent downloads
    semaphore: Arc<Semaphore>,

    fetcher: Arc<ArtifactFetcher>,

    /// Submitted tasks in submission order
    in_flight: Vec<(DownloadTask, JoinHandle<DownloadOutcome>)>,

    max_parallel: usize,
}

impl DownloadPool {
    /// Creates a pool; `max_parallel` is clamped to at least one
    pub fn new(fetcher: Arc<ArtifactFetcher>, max_parallel: usize) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_parallel)),
            fetcher,
            in_flight: Vec::new(),
            max_parallel,
        }
    }

    /// Queues a task for download
    pub fn submit(&mut self, task: DownloadTask) {
        let semaphore = self.semaphore.clone();
        let fetcher = self.fetcher.clone();
        let queued = task.clone();

        tracing::debug!("Submitting download {}", task.url);
        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return DownloadOutcome::failure(
                        queued,
                        ArtifactFetchError::Aborted("download pool closed".to_string()),
                    )
                }
            };
            fetcher.fetch_and_store(queued).await
        });

        self.in_flight.push((task, handle));
    }

    /// Number of tasks submitted so far
    pub fn submitted(&self) -> usize {
        self.in_flight.len()
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Waits for every submitted task and returns outcomes in submission order
    pub async fn drain(self) -> Vec<DownloadOutcome> {
        let mut outcomes = Vec::with_capacity(self.in_flight.len());

        for (task, handle) in self.in_flight {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Download worker for {} crashed: {}", task.url, e);
                    outcomes.push(DownloadOutcome::failure(
                        task,
                        ArtifactFetchError::Aborted(e.to_string()),
                    ));
                }
            }
        }

        outcomes
    }
}
