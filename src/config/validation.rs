use crate::config::types::{Config, DownloadConfig, FeedConfig, StorageConfig, UserAgentConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Largest page the arXiv listing API serves in one response
const MAX_PAGE_SIZE: u32 = 2000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_feed_config(&config.feed)?;
    validate_download_config(&config.download)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates listing query configuration
fn validate_feed_config(config: &FeedConfig) -> ConfigResult<()> {
    validate_http_url("api_url", &config.api_url)?;
    validate_category(&config.category)?;

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    Ok(())
}

/// Validates download configuration
fn validate_download_config(config: &DownloadConfig) -> ConfigResult<()> {
    validate_http_url("artifact_url", &config.artifact_url)?;

    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.max_parallel_downloads < 1 || config.max_parallel_downloads > 100 {
        return Err(ConfigError::Validation(format!(
            "max_parallel_downloads must be between 1 and 100, got {}",
            config.max_parallel_downloads
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    for (media_type, extension) in &config.extensions {
        if media_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extension mapping has an empty media type".to_string(),
            ));
        }
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "extension for '{}' must be non-empty and alphanumeric, got '{}'",
                media_type, extension
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates run ledger configuration
fn validate_storage_config(config: &StorageConfig) -> ConfigResult<()> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates that a URL parses and uses http or https
fn validate_http_url(field: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// Validates an arXiv category filter such as "cs.AI", "astro-ph" or "cs.*"
fn validate_category(category: &str) -> ConfigResult<()> {
    if category.is_empty() {
        return Err(ConfigError::Validation(
            "category cannot be empty".to_string(),
        ));
    }

    if !category
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '*'))
    {
        return Err(ConfigError::Validation(format!(
            "category '{}' contains invalid characters",
            category
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> ConfigResult<()> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        Config {
            feed: FeedConfig {
                api_url: "https://export.arxiv.org/api/query".to_string(),
                category: "cs.AI".to_string(),
                page_size: 100,
                request_delay_ms: 3000,
            },
            download: DownloadConfig {
                artifact_url: "https://export.arxiv.org/e-print/".to_string(),
                output_dir: "./downloads".to_string(),
                max_parallel_downloads: 4,
                skip_existing: false,
                timeout_secs: 60,
                extensions: HashMap::new(),
            },
            user_agent: UserAgentConfig {
                crawler_name: "CatchupBot".to_string(),
                crawler_version: "1.0.0".to_string(),
                contact_url: "https://example.com/contact".to_string(),
                contact_email: "ops@example.com".to_string(),
            },
            storage: StorageConfig {
                database_path: "./catchup.db".to_string(),
            },
        }
    }

    fn assert_validation_error(config: &Config) {
        assert!(matches!(validate(config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = valid_config();

        config.feed.page_size = 1;
        assert!(validate(&config).is_ok());
        config.feed.page_size = 2000;
        assert!(validate(&config).is_ok());

        config.feed.page_size = 0;
        assert_validation_error(&config);
        config.feed.page_size = 2001;
        assert_validation_error(&config);
    }

    #[test]
    fn test_max_parallel_downloads_bounds() {
        let mut config = valid_config();

        config.download.max_parallel_downloads = 100;
        assert!(validate(&config).is_ok());

        config.download.max_parallel_downloads = 0;
        assert_validation_error(&config);
        config.download.max_parallel_downloads = 101;
        assert_validation_error(&config);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.download.timeout_secs = 0;
        assert_validation_error(&config);
    }

    #[test]
    fn test_extension_mapping() {
        let mut config = valid_config();
        config
            .download
            .extensions
            .insert("application/x-eprint-tar".to_string(), "tgz".to_string());
        assert!(validate(&config).is_ok());

        // Extensions are given without the leading dot
        config
            .download
            .extensions
            .insert("application/gzip".to_string(), ".gz".to_string());
        assert_validation_error(&config);

        config.download.extensions.clear();
        config.download.extensions.insert("application/gzip".to_string(), String::new());
        assert_validation_error(&config);

        config.download.extensions.clear();
        config.download.extensions.insert("  ".to_string(), "gz".to_string());
        assert_validation_error(&config);
    }

    #[test]
    fn test_validate_category() {
        assert!(validate_category("cs.AI").is_ok());
        assert!(validate_category("astro-ph").is_ok());
        assert!(validate_category("cs.*").is_ok());

        assert!(validate_category("").is_err());
        assert!(validate_category("cs AI").is_err());
        assert!(validate_category("cat:cs.AI").is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("api_url", "https://export.arxiv.org/api/query").is_ok());
        assert!(validate_http_url("api_url", "http://127.0.0.1:8080/api").is_ok());

        assert!(validate_http_url("api_url", "not a url").is_err());
        assert!(validate_http_url("api_url", "ftp://example.com/").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
