//! Catalog source
//!
//! The crawler only sees the catalog through [`CatalogSource`]: a listing
//! per partition, a cover link per movie and numbered review pages per
//! movie. [`HttpCatalogSource`] is the real implementation, composed from
//! the fetcher, the endpoint builder and the page extractors.

mod endpoints;

pub use endpoints::Endpoints;

use crate::config::Config;
use crate::crawler::{build_http_client, fetch_url, FetchError};
use crate::extract::{
    DetailExtractor, ExtractionMiss, Extractor, ListingEntry, ListingExtractor, ReviewExtractor,
    ReviewPage,
};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;

/// Entries of one listing page; anomalies are kept so the caller can log them
pub type ListingPage = Vec<Result<ListingEntry, ExtractionMiss>>;

/// The upstream catalog as seen by the crawler
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Movies listed for one partition, in upstream order
    async fn list_page(&self, partition: i32) -> Result<ListingPage, FetchError>;

    /// Cover link for a movie; lookup failures yield `None`
    async fn cover_url(&self, item_id: &str) -> Option<String>;

    /// Review page `page` (1-based) for a movie; a page without blocks means exhausted
    async fn review_page(&self, item_id: &str, page: u32) -> Result<ReviewPage, FetchError>;
}

/// Catalog source backed by HTTP requests
pub struct HttpCatalogSource {
    client: Client,
    endpoints: Endpoints,
    listing: ListingExtractor,
    reviews: ReviewExtractor,
    detail: DetailExtractor,
}

impl HttpCatalogSource {
    /// Creates a source using an existing HTTP client
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        let root = endpoints.root().clone();
        Self {
            client,
            endpoints,
            listing: ListingExtractor::new(root.clone()),
            reviews: ReviewExtractor,
            detail: DetailExtractor::new(root),
        }
    }

    /// Builds the HTTP client and endpoints from configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let endpoints = Endpoints::new(&config.source)?;
        Ok(Self::new(client, endpoints))
    }

    fn invalid_url(url: String, error: url::ParseError) -> FetchError {
        FetchError::Request {
            url,
            status: None,
            message: format!("Invalid URL: {}", error),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn list_page(&self, partition: i32) -> Result<ListingPage, FetchError> {
        let url = self
            .endpoints
            .listing_url(partition)
            .map_err(|e| Self::invalid_url(format!("listing for {}", partition), e))?;

        tracing::debug!("Fetching listing for partition {}: {}", partition, url);
        let page = fetch_url(&self.client, url.as_str()).await?;
        Ok(self.listing.extract(&page.body))
    }

    async fn cover_url(&self, item_id: &str) -> Option<String> {
        let url = match self.endpoints.detail_url(item_id) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build detail URL for item {}: {}", item_id, e);
                return None;
            }
        };

        match fetch_url(&self.client, url.as_str()).await {
            Ok(page) => self.detail.extract(&page.body).into_iter().next(),
            Err(e) => {
                tracing::warn!("Failed to fetch cover for item {}: {}", item_id, e);
                None
            }
        }
    }

    async fn review_page(&self, item_id: &str, page: u32) -> Result<ReviewPage, FetchError> {
        let url = self
            .endpoints
            .review_url(item_id, page)
            .map_err(|e| Self::invalid_url(format!("reviews {} of {}", page, item_id), e))?;

        tracing::trace!("Fetching review page {} for item {}", page, item_id);
        let fetched = fetch_url(&self.client, url.as_str()).await?;
        Ok(self.reviews.extract_page(&fetched.body))
    }
}
