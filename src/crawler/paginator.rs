//! Review pagination for a single movie
//!
//! The paginator requests review pages 1, 2, 3, ... until a page comes back
//! without review blocks. A rate-limited page is skipped (its number is consumed, nothing is
//! recorded for it) and any other request failure ends the pagination with
//! whatever was collected so far.

use crate::crawler::{FetchError, RetryDecision, RetryPolicy};
use crate::extract::RawReview;
use crate::source::CatalogSource;

/// Pagination progress for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    /// About to request this page
    Fetching { page: u32 },

    /// This page had review blocks and its readable reviews were kept
    Accumulating { page: u32 },

    /// A page without review blocks was reached
    Exhausted,

    /// A request failed and pagination stopped early
    Aborted,
}

/// How a pagination ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationEnd {
    /// A page without review blocks was reached; every review page was seen
    Exhausted,

    /// Stopped at `page` because of `error`
    Aborted { page: u32, error: FetchError },
}

/// Everything one pagination produced
#[derive(Debug, Clone)]
pub struct PaginationOutcome {
    /// Reviews in page order, then in-page order
    pub reviews: Vec<RawReview>,

    /// Pages that had at least one review block
    pub pages_fetched: u32,

    /// Page numbers skipped because they were rate limited
    pub skipped_pages: Vec<u32>,

    /// Terminal state
    pub end: PaginationEnd,
}

impl PaginationOutcome {
    /// Returns true if pagination reached the last page
    pub fn is_complete(&self) -> bool {
        matches!(self.end, PaginationEnd::Exhausted)
    }
}

/// Drives review pages for one item until exhaustion
pub struct ReviewPaginator<'a, S: ?Sized> {
    source: &'a S,
    policy: &'a RetryPolicy,
}

impl<'a, S: CatalogSource + ?Sized> ReviewPaginator<'a, S> {
    pub fn new(source: &'a S, policy: &'a RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Collects every review of `item_id`
    pub async fn paginate(&self, item_id: &str) -> PaginationOutcome {
        let mut reviews = Vec::new();
        let mut pages_fetched = 0;
        let mut skipped_pages = Vec::new();
        let mut consecutive_rate_limits = 0;
        let mut aborted = None;

        let mut state = PaginationState::Fetching { page: 1 };
        loop {
            state = match state {
                PaginationState::Fetching { page } => {
                    match self.source.review_page(item_id, page).await {
                        Ok(fetched) if fetched.is_exhausted() => PaginationState::Exhausted,
                        Ok(fetched) => {
                            consecutive_rate_limits = 0;
                            pages_fetched += 1;
                            reviews.extend(fetched.reviews);
                            PaginationState::Accumulating { page }
                        }
                        Err(error) => {
                            if error.is_rate_limited() {
                                consecutive_rate_limits += 1;
                            }
                            match self.policy.decide(&error, consecutive_rate_limits) {
                                RetryDecision::Advance => {
                                    tracing::warn!(
                                        "Rate limited on page {} of item {}; skipping to page {}",
                                        page,
                                        item_id,
                                        page + 1
                                    );
                                    skipped_pages.push(page);
                                    self.policy.pause().await;
                                    PaginationState::Fetching { page: page + 1 }
                                }
                                RetryDecision::Abort => {
                                    tracing::warn!(
                                        "Stopping reviews of item {} at page {}: {}",
                                        item_id,
                                        page,
                                        error
                                    );
                                    aborted = Some(PaginationEnd::Aborted { page, error });
                                    PaginationState::Aborted
                                }
                            }
                        }
                    }
                }
                PaginationState::Accumulating { page } => {
                    PaginationState::Fetching { page: page + 1 }
                }
                PaginationState::Exhausted | PaginationState::Aborted => break,
            };
        }

        PaginationOutcome {
            reviews,
            pages_fetched,
            skipped_pages,
            end: aborted.unwrap_or(PaginationEnd::Exhausted),
        }
    }
}
