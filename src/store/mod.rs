//! Storage module for persisting harvest results
//!
//! This module owns everything that touches disk:
//! - Append-only CSV sinks for movies and reviews
//! - The checkpoint index built from the review store
//! - The explicit crawl cursor used to resume interrupted runs
//!
//! Every row is flushed as soon as it is written, so an interrupted run
//! leaves both CSV files readable and the next run can pick up from them.

mod checkpoint;
mod cursor;
mod sink;

pub use checkpoint::{purge_item, CheckpointStore};
pub use cursor::{CrawlCursor, CursorStore};
pub use sink::{AppendSink, CsvRecord, ItemSink, ReviewSink};

use serde::{Deserialize, Serialize};

/// Ratings strictly above this value are labelled positive
pub const POSITIVE_RATING_THRESHOLD: i32 = 5;

/// A movie row in the item store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Link")]
    pub detail_link: String,

    #[serde(rename = "Id")]
    pub item_id: String,

    /// Release year the movie was listed under
    #[serde(rename = "Partition")]
    pub partition: i32,

    #[serde(rename = "CoverLink")]
    pub cover_link: Option<String>,
}

impl CsvRecord for ListingRecord {
    const HEADER: &'static [&'static str] = &["Title", "Link", "Id", "Partition", "CoverLink"];
}

/// A review row in the review store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "Id")]
    pub item_id: String,

    /// Sanitized comment text
    #[serde(rename = "Comment")]
    pub text: String,

    /// 1 for a positive review, 0 otherwise
    #[serde(rename = "Label")]
    pub label: u8,
}

impl ReviewRecord {
    /// Builds a review row, deriving the label from the raw rating
    pub fn new(item_id: impl Into<String>, text: impl Into<String>, rating: i32) -> Self {
        Self {
            item_id: item_id.into(),
            text: text.into(),
            label: label_for_rating(rating),
        }
    }
}

impl CsvRecord for ReviewRecord {
    const HEADER: &'static [&'static str] = &["Id", "Comment", "Label"];
}

/// Maps a raw rating to a binary label: `1` if `rating > 5`, else `0`
pub fn label_for_rating(rating: i32) -> u8 {
    u8::from(rating > POSITIVE_RATING_THRESHOLD)
}
