//! Crawler module for harvesting listings and reviews
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with rate-limit classification
//! - The skip-on-429 retry policy
//! - Review pagination per movie
//! - Resume position tracking
//! - Overall crawl coordination

mod driver;
mod fetcher;
mod paginator;
mod resume;
mod retry;

pub use driver::{CrawlDriver, CrawlStats};
pub use fetcher::{build_http_client, fetch_url, user_agent_string, FetchError, FetchedPage};
pub use paginator::{PaginationEnd, PaginationOutcome, PaginationState, ReviewPaginator};
pub use resume::{plan_resume, Boundary, ItemDisposition, ResumePlan, ResumeStart, ResumeState};
pub use retry::{RetryDecision, RetryPolicy};

use crate::config::Config;
use crate::source::HttpCatalogSource;
use crate::HarvestError;

/// Runs a complete harvest against the configured catalog
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and catalog source
/// 2. Recover from any interrupted run and open the stores
/// 3. Walk every partition, harvesting metadata and reviews
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `fresh` - Ignore saved resume positions
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl ran to the last partition
/// * `Err(HarvestError)` - A store could not be read or written
pub async fn crawl(config: Config, fresh: bool) -> Result<CrawlStats, HarvestError> {
    let source = HttpCatalogSource::from_config(&config)?;
    let mut driver = CrawlDriver::new(source, &config, fresh)?;
    driver.run().await
}
