//! Listing API client

use crate::feed::{parse_feed, FeedError, FeedPage};
use reqwest::Client;
use url::Url;

/// Queries the listing API one page at a time
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    api_url: Url,
}

impl FeedClient {
    /// Creates a client for the listing endpoint at `api_url`
    pub fn new(client: Client, api_url: Url) -> Self {
        Self { client, api_url }
    }

    /// Returns the listing endpoint
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Fetches one page of entries in `category`, most recently updated first
    ///
    /// # Arguments
    ///
    /// * `category` - Category filter, sent as `cat:<category>`
    /// * `page_size` - Entries requested (`max_results`)
    /// * `offset` - Index of the first entry (`start`)
    ///
    /// # Returns
    ///
    /// * `Ok(FeedPage)` - The page, in server order
    /// * `Err(FeedError)` - Transport failure, non-success status, or unparseable body
    pub async fn query_page(
        &self,
        category: &str,
        page_size: usize,
        offset: usize,
    ) -> Result<FeedPage, FeedError> {
        tracing::debug!(
            "Querying {} for cat:{} (start={}, max_results={})",
            self.api_url,
            category,
            offset,
            page_size
        );

        let response = self
            .client
            .get(self.api_url.clone())
            .query(&[
                ("search_query", format!("cat:{}", category)),
                ("sortBy", "lastUpdatedDate".to_string()),
                ("sortOrder", "descending".to_string()),
                ("max_results", page_size.to_string()),
                ("start", offset.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_feed(&body, offset)
    }
}
