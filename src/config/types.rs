use serde::Deserialize;
use std::collections::HashMap;

/// Default arXiv listing endpoint
pub const DEFAULT_API_URL: &str = "https://export.arxiv.org/api/query";

/// Default arXiv e-print endpoint
pub const DEFAULT_ARTIFACT_URL: &str = "https://export.arxiv.org/e-print/";

/// Main configuration structure for arxiv-catchup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub download: DownloadConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
}

/// Listing query configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the listing API
    #[serde(rename = "api-url", default = "default_api_url")]
    pub api_url: String,

    /// Category filter (e.g., "cs.AI" or "astro-ph")
    pub category: String,

    /// Number of entries requested per listing page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Pause between consecutive listing requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

/// Artifact download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Endpoint that entry identifiers are appended to
    #[serde(rename = "artifact-url", default = "default_artifact_url")]
    pub artifact_url: String,

    /// Directory receiving downloaded artifacts
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Maximum number of downloads in flight
    #[serde(
        rename = "max-parallel-downloads",
        default = "default_max_parallel_downloads"
    )]
    pub max_parallel_downloads: u32,

    /// Skip entries whose artifact is already present in the output directory
    #[serde(rename = "skip-existing", default)]
    pub skip_existing: bool,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra media type to file extension mappings
    #[serde(default)]
    pub extensions: HashMap<String, String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Run ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_artifact_url() -> String {
    DEFAULT_ARTIFACT_URL.to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_delay_ms() -> u64 {
    3000
}

fn default_max_parallel_downloads() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    60
}
