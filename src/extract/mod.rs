//! Page extractors
//!
//! Each catalog page shape (listing, review, detail) has its own extractor
//! turning raw HTML into typed records. Extractors never touch the network;
//! the crawler hands them page bodies and decides what an empty result means.

mod detail;
mod listing;
mod review;
mod sanitize;

pub use detail::DetailExtractor;
pub use listing::{parse_item_id, ListingEntry, ListingExtractor};
pub use review::{RawReview, ReviewExtractor, ReviewPage};
pub use sanitize::sanitize_comment;

use scraper::ElementRef;
use thiserror::Error;
use url::Url;

/// Turns the HTML of one page shape into a sequence of records
pub trait Extractor {
    /// The record produced for each matching block on the page
    type Record;

    /// Extracts every record from the page, in document order
    fn extract(&self, html: &str) -> Vec<Self::Record>;
}

/// Expected structure that was absent from a listing entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionMiss {
    #[error("listing entry '{title}' has no link")]
    MissingLink { title: String },

    #[error("could not extract an item id from link {link}")]
    MissingId { link: String },
}

/// Concatenates an element's text nodes, trimming each one and dropping blanks
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves an href against the page's base URL
pub(crate) fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|url| url.to_string())
}
