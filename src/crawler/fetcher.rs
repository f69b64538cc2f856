//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Error classification (rate limited vs. other request failures)
//!
//! The fetcher never retries. Deciding what to do after a failure is the
//! job of [`RetryPolicy`](crate::crawler::RetryPolicy) at the call site.

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

/// Classified fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The upstream answered HTTP 429
    #[error("rate limited (HTTP 429) at {url}")]
    RateLimited { url: String },

    /// Any other non-2xx status, network failure or unreadable body
    #[error("request to {url} failed: {message}")]
    Request {
        url: String,
        status: Option<u16>,
        message: String,
    },
}

impl FetchError {
    /// Returns true for the rate-limited variant
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Formats the user agent string: `Name/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Timeouts used for every request
///
/// # Example
///
/// ```no_run
/// use reel_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use reel_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(user_agent))
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Ok(FetchedPage)` |
/// | HTTP 429 | `FetchError::RateLimited` |
/// | Other status | `FetchError::Request` with the status |
/// | Timeout / connect / body error | `FetchError::Request` without a status |
pub async fn fetch_url(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let response = client.get(url).send().await.map_err(|e| {
        let message = if e.is_timeout() {
            "Request timeout".to_string()
        } else if e.is_connect() {
            format!("Connection failed: {}", e)
        } else {
            e.to_string()
        };
        FetchError::Request {
            url: url.to_string(),
            status: None,
            message,
        }
    })?;

    let status = response.status();
    let final_url = response.url().to_string();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited {
            url: url.to_string(),
        });
    }

    if !status.is_success() {
        return Err(FetchError::Request {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    let body = response.text().await.map_err(|e| FetchError::Request {
        url: url.to_string(),
        status: Some(status.as_u16()),
        message: format!("Failed to read body: {}", e),
    })?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        body,
    })
}
