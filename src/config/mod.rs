//! Configuration module for arxiv-catchup
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use arxiv_catchup::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("catchup.toml")).unwrap();
//! println!("Listing category: {}", config.feed.category);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DownloadConfig, FeedConfig, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
