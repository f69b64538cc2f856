//! Crawl driver - main harvest orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Startup recovery and the resume position
//! - Walking listing pages partition by partition
//! - Skipping items finished by earlier runs
//! - Paginating reviews and writing both stores

use crate::config::Config;
use crate::crawler::paginator::{PaginationEnd, ReviewPaginator};
use crate::crawler::resume::{plan_resume, ItemDisposition, ResumeStart, ResumeState};
use crate::crawler::retry::{RetryDecision, RetryPolicy};
use crate::extract::{sanitize_comment, ListingEntry};
use crate::source::CatalogSource;
use crate::store::{
    purge_item, CheckpointStore, CursorStore, ItemSink, ListingRecord, ReviewRecord, ReviewSink,
};
use crate::HarvestError;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Instant;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Partitions whose listing was fetched
    pub partitions_crawled: u64,

    /// Partitions skipped because the listing could not be fetched
    pub partitions_failed: u64,

    /// Listing entries with a usable id
    pub items_seen: u64,

    /// Items skipped while replaying up to the resume position
    pub items_skipped: u64,

    /// Items whose reviews were paginated to the end
    pub items_processed: u64,

    /// Items whose pagination stopped on a request error
    pub items_incomplete: u64,

    /// Items that already had review rows; metadata only
    pub items_already_reviewed: u64,

    /// Listing entries dropped for a missing link or id
    pub extraction_misses: u64,

    /// Review rows appended
    pub reviews_written: u64,

    /// Review pages skipped because they were rate limited
    pub review_pages_skipped: u64,
}

/// Resumable crawl over a catalog source
pub struct CrawlDriver<S> {
    source: S,
    partitions: RangeInclusive<i32>,
    fetch_covers: bool,
    policy: RetryPolicy,
    items: ItemSink,
    reviews: ReviewSink,
    checkpoint: CheckpointStore,
    cursor: CursorStore,
    resume: ResumeState,
    start: ResumeStart,
    listing_rate_limits: u32,
    stats: CrawlStats,
}

impl<S: CatalogSource> CrawlDriver<S> {
    /// Prepares a crawl: recovers from any interrupted run, then opens the stores
    ///
    /// # Arguments
    ///
    /// * `source` - Where listings and reviews come from
    /// * `config` - The harvest configuration
    /// * `fresh` - Ignore saved resume positions and start from the first partition
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlDriver)` - Stores are open and the resume position is set
    /// * `Err(HarvestError)` - A store could not be read, repaired or opened
    pub fn new(source: S, config: &Config, fresh: bool) -> Result<Self, HarvestError> {
        let reviews_path = Path::new(&config.output.reviews_path);
        let cursor_path = Path::new(&config.output.cursor_path);

        let plan = plan_resume(reviews_path, cursor_path, fresh)?;
        let mut cursor = CursorStore::new(cursor_path, plan.cursor);

        if let Some(item_id) = &plan.discard {
            tracing::warn!(
                "Item {} may have been interrupted mid-write; discarding its review rows",
                item_id
            );
            cursor.persist()?;
            purge_item(reviews_path, item_id)?;
        }
        cursor.clear_in_progress()?;

        tracing::info!("Start position: {}", plan.start);

        let checkpoint = CheckpointStore::load(reviews_path)?;
        let items = ItemSink::open(Path::new(&config.output.movies_path))?;
        let reviews = ReviewSink::open(reviews_path)?;

        Ok(Self {
            source,
            partitions: config.source.partitions(),
            fetch_covers: config.crawler.fetch_covers,
            policy: RetryPolicy::from_config(&config.crawler),
            items,
            reviews,
            checkpoint,
            cursor,
            resume: plan.start.initial_state(),
            start: plan.start,
            listing_rate_limits: 0,
            stats: CrawlStats::default(),
        })
    }

    /// Current skip/resume state
    pub fn resume_state(&self) -> &ResumeState {
        &self.resume
    }

    /// Counters collected so far
    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs the crawl over every configured partition
    ///
    /// Only store I/O failures end the run early; upstream failures are
    /// logged and skipped.
    pub async fn run(&mut self) -> Result<CrawlStats, HarvestError> {
        let start_time = Instant::now();
        tracing::info!(
            "Crawling partitions {}..={} ({})",
            self.partitions.start(),
            self.partitions.end(),
            self.start
        );

        for partition in self.partitions.clone() {
            self.crawl_partition(partition).await?;
        }

        if let Some(target) = self.resume.pending_target() {
            tracing::warn!(
                "Resume item {} never appeared in the listing; nothing was processed. \
                 Run with --fresh to start over.",
                target
            );
        }

        tracing::info!(
            "Crawl finished in {:?}: {} items processed, {} incomplete, {} already reviewed, \
             {} skipped, {} reviews written",
            start_time.elapsed(),
            self.stats.items_processed,
            self.stats.items_incomplete,
            self.stats.items_already_reviewed,
            self.stats.items_skipped,
            self.stats.reviews_written
        );

        Ok(self.stats.clone())
    }

    async fn crawl_partition(&mut self, partition: i32) -> Result<(), HarvestError> {
        let entries = match self.source.list_page(partition).await {
            Ok(entries) => {
                self.listing_rate_limits = 0;
                entries
            }
            Err(error) => {
                if error.is_rate_limited() {
                    self.listing_rate_limits += 1;
                }
                self.stats.partitions_failed += 1;
                match self.policy.decide(&error, self.listing_rate_limits) {
                    RetryDecision::Advance => {
                        tracing::warn!(
                            "Rate limited on listing for partition {}; moving to the next one",
                            partition
                        );
                        self.policy.pause().await;
                    }
                    RetryDecision::Abort => {
                        tracing::error!("Listing for partition {} failed: {}", partition, error);
                    }
                }
                return Ok(());
            }
        };

        if entries.is_empty() {
            tracing::info!("No movies listed for partition {}", partition);
        }

        for entry in entries {
            match entry {
                Ok(entry) => self.process_item(partition, entry).await?,
                Err(miss) => {
                    self.stats.extraction_misses += 1;
                    tracing::warn!("Skipping listing entry in partition {}: {}", partition, miss);
                }
            }
        }

        self.stats.partitions_crawled += 1;
        tracing::info!(
            "Progress: partition {} done, {} items processed, {} reviews written",
            partition,
            self.stats.items_processed,
            self.stats.reviews_written
        );

        Ok(())
    }

    async fn process_item(
        &mut self,
        partition: i32,
        entry: ListingEntry,
    ) -> Result<(), HarvestError> {
        self.stats.items_seen += 1;
        let item_id = entry.item_id;

        if self.resume.observe(&item_id) == ItemDisposition::Skip {
            self.stats.items_skipped += 1;
            tracing::trace!("Skipping item {} (before resume position)", item_id);
            return Ok(());
        }

        tracing::info!("Processing item {}: {}", item_id, entry.title);

        let cover_link = if self.fetch_covers {
            self.source.cover_url(&item_id).await
        } else {
            None
        };

        self.items.append(&ListingRecord {
            title: entry.title,
            detail_link: entry.detail_link,
            item_id: item_id.clone(),
            partition,
            cover_link,
        })?;

        if self.checkpoint.is_processed(&item_id) {
            tracing::info!("Reviews for item {} already harvested", item_id);
            self.stats.items_already_reviewed += 1;
            self.cursor.complete(&item_id)?;
            return Ok(());
        }

        let outcome = ReviewPaginator::new(&self.source, &self.policy)
            .paginate(&item_id)
            .await;
        self.stats.review_pages_skipped += outcome.skipped_pages.len() as u64;

        if outcome.reviews.is_empty() {
            tracing::info!("No reviews found for item {}", item_id);
        } else {
            self.cursor.begin(&item_id)?;
            for raw in &outcome.reviews {
                let text = sanitize_comment(&raw.text);
                self.reviews
                    .append(&ReviewRecord::new(item_id.as_str(), text, raw.rating))?;
            }
            self.checkpoint.mark_processed(&item_id);
            self.stats.reviews_written += outcome.reviews.len() as u64;
            tracing::info!(
                "Wrote {} reviews for item {} from {} pages",
                outcome.reviews.len(),
                item_id,
                outcome.pages_fetched
            );
        }

        match outcome.end {
            PaginationEnd::Exhausted => {
                self.stats.items_processed += 1;
                self.cursor.complete(&item_id)?;
            }
            PaginationEnd::Aborted { page, .. } => {
                self.stats.items_incomplete += 1;
                tracing::warn!(
                    "Reviews of item {} are incomplete (stopped at page {})",
                    item_id,
                    page
                );
                self.cursor.abandon(&item_id)?;
            }
        }

        Ok(())
    }
}
