//! Shared retry policy
//!
//! There is exactly one rule: a rate-limited request is never repeated, the
//! caller moves on to its next page or partition instead; any other request
//! failure ends the caller's current unit of work. Forward progress is
//! preferred over completeness, so a page skipped on a 429 is not revisited.

use crate::config::CrawlerConfig;
use crate::crawler::FetchError;
use std::time::Duration;

/// What the caller should do after a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Skip this page or partition and continue with the next one
    Advance,

    /// Stop the enclosing unit of work
    Abort,
}

/// Skip-or-abort policy applied wherever the crawler fetches
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    /// Fixed pause before advancing past a rate-limited request
    pub rate_limit_pause: Duration,

    /// Consecutive rate-limited requests tolerated in one loop (`None` = no limit)
    pub max_consecutive_rate_limits: Option<u32>,
}

impl RetryPolicy {
    /// Builds the policy from crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            rate_limit_pause: Duration::from_millis(config.rate_limit_pause_ms),
            max_consecutive_rate_limits: match config.max_consecutive_rate_limits {
                0 => None,
                n => Some(n),
            },
        }
    }

    /// Decides how to react to `error`
    ///
    /// `consecutive_rate_limits` counts the rate-limited responses in a row
    /// seen by the caller, including this one.
    pub fn decide(&self, error: &FetchError, consecutive_rate_limits: u32) -> RetryDecision {
        match error {
            FetchError::RateLimited { .. } => match self.max_consecutive_rate_limits {
                Some(limit) if consecutive_rate_limits >= limit => RetryDecision::Abort,
                _ => RetryDecision::Advance,
            },
            FetchError::Request { .. } => RetryDecision::Abort,
        }
    }

    /// Sleeps for the configured rate-limit pause, if any
    pub async fn pause(&self) {
        if !self.rate_limit_pause.is_zero() {
            tokio::time::sleep(self.rate_limit_pause).await;
        }
    }
}
