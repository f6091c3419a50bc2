//! Artifact fetcher
//!
//! This module handles the download side of a run:
//! - Building the HTTP client with a proper user agent string
//! - Resolving a file extension from the response Content-Type
//! - Persisting each artifact through a temporary file so failures never leave a corrupt file

use crate::config::UserAgentConfig;
use crate::state::{ArtifactFetchError, DownloadOutcome, DownloadTask};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use arxiv_catchup::config::UserAgentConfig;
/// use arxiv_catchup::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ArxivCatchup".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(60)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Media type to file extension lookup
///
/// The defaults cover what the e-print endpoint serves. Unknown media types
/// resolve to no extension.
#[derive(Debug, Clone)]
pub struct ExtensionMap {
    by_media_type: HashMap<String, String>,
}

impl Default for ExtensionMap {
    fn default() -> Self {
        let mut map = Self {
            by_media_type: HashMap::new(),
        };
        map.insert("application/x-eprint-tar", "tar");
        map.insert("application/pdf", "pdf");
        map.insert("application/x-eprint", "tex");
        map
    }
}

impl ExtensionMap {
    /// Adds or replaces a mapping. `extension` is given without the dot.
    pub fn insert(&mut self, media_type: &str, extension: &str) {
        self.by_media_type.insert(
            normalize_media_type(media_type),
            extension.trim_start_matches('.').to_string(),
        );
    }

    /// Extends the defaults with extra mappings
    pub fn with_mappings<'a>(mut self, mappings: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (media_type, extension) in mappings {
            self.insert(media_type, extension);
        }
        self
    }

    /// Looks up the extension for a Content-Type value; parameters are ignored
    pub fn extension_for(&self, content_type: &str) -> Option<&str> {
        self.by_media_type
            .get(&normalize_media_type(content_type))
            .map(String::as_str)
    }

    /// Appends the extension matching `content_type` to `base`
    pub fn resolve_filename(&self, base: &str, content_type: Option<&str>) -> String {
        match content_type.and_then(|ct| self.extension_for(ct)) {
            Some(extension) => format!("{}.{}", base, extension),
            None => base.to_string(),
        }
    }

    /// All filenames an artifact for `base` could have been stored under
    pub fn candidate_filenames(&self, base: &str) -> Vec<String> {
        let mut candidates = vec![base.to_string()];
        candidates.extend(
            self.by_media_type
                .values()
                .map(|extension| format!("{}.{}", base, extension)),
        );
        candidates
    }
}

fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Downloads artifacts into an output directory
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: Client,
    output_dir: PathBuf,
    extensions: ExtensionMap,
    skip_existing: bool,
}

impl ArtifactFetcher {
    pub fn new(client: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            extensions: ExtensionMap::default(),
            skip_existing: false,
        }
    }

    pub fn with_extensions(mut self, extensions: ExtensionMap) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetches one artifact and stores it under the output directory
    ///
    /// # Request Flow
    ///
    /// 1. With skip-existing on, return `Skipped` if an artifact for the
    ///    target filename is already present
    /// 2. GET the task URL; a non-success status is a `Failure`
    /// 3. Resolve the extension from Content-Type
    /// 4. Write the body to a temporary file in the output directory, sync
    ///    it, then persist it over `<file>`
    ///
    /// Never returns an error: every failure is captured in the outcome.
    pub async fn fetch_and_store(&self, task: DownloadTask) -> DownloadOutcome {
        if self.skip_existing {
            if let Some(existing) = self.find_existing(&task.target_filename).await {
                tracing::debug!("Skipping {}: {} exists", task.url, existing.display());
                return DownloadOutcome::skipped(task, existing);
            }
        }

        let response = match self.client.get(&task.url).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    e.to_string()
                };
                tracing::warn!("Download of {} failed: {}", task.url, reason);
                return DownloadOutcome::failure(task, ArtifactFetchError::Network(reason));
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Download of {} failed: HTTP {}", task.url, status.as_u16());
            return DownloadOutcome::failure(task, ArtifactFetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let filename = self
            .extensions
            .resolve_filename(&task.target_filename, content_type.as_deref());

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Reading body of {} failed: {}", task.url, e);
                return DownloadOutcome::failure(task, ArtifactFetchError::Network(e.to_string()));
            }
        };

        let path = self.output_dir.join(&filename);
        let bytes_written = body.len() as u64;
        let target = path.clone();
        let written = tokio::task::spawn_blocking(move || persist_atomically(&target, &body)).await;

        match written {
            Ok(Ok(())) => {
                tracing::info!("Downloaded {} ({} bytes)", path.display(), bytes_written);
                DownloadOutcome::success(task, bytes_written, path)
            }
            Ok(Err(e)) => {
                tracing::warn!("Writing {} failed: {}", path.display(), e);
                DownloadOutcome::failure(task, ArtifactFetchError::Io(e.to_string()))
            }
            Err(e) => {
                tracing::error!("Writer for {} crashed: {}", path.display(), e);
                DownloadOutcome::failure(task, ArtifactFetchError::Io(e.to_string()))
            }
        }
    }

    async fn find_existing(&self, base: &str) -> Option<PathBuf> {
        for candidate in self.extensions.candidate_filenames(base) {
            let path = self.output_dir.join(candidate);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }
}

/// Writes `bytes` to a temporary file next to `path` and persists it over `path`
///
/// The temporary file is removed on any failure, so `path` either keeps its
/// previous content or receives the complete new content.
fn persist_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut temp_file = NamedTempFile::new_in(parent_dir)?;
    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(path).map_err(|e| e.error)?;

    // Best effort: make the rename itself durable
    if let Ok(dir) = std::fs::File::open(parent_dir) {
        let _ = dir.sync_all();
    }

    Ok(())
}
