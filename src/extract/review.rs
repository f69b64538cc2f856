//! Review page extraction
//!
//! Review pages list comment bodies (`div.review-text1`) and the reviewer's
//! numeric rating (`div.user-reviews-movie-rating`) as two parallel sequences.
//! A page without both is the upstream's way of saying the reviews ran out.

use crate::extract::{stripped_text, Extractor};
use scraper::{Html, Selector};

/// One review as it appears upstream, before sanitization and labelling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReview {
    /// Comment text with surrounding whitespace removed
    pub text: String,

    /// Reviewer rating on the upstream 1-10 scale
    pub rating: i32,
}

/// Everything extracted from one review page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPage {
    /// Comment/rating blocks found on the page, readable or not
    pub blocks: usize,

    /// Reviews whose rating could be read, in page order
    pub reviews: Vec<RawReview>,
}

impl ReviewPage {
    /// Returns true if the page had no review blocks at all
    pub fn is_exhausted(&self) -> bool {
        self.blocks == 0
    }
}

/// Extracts reviews from a review page
#[derive(Debug, Clone, Default)]
pub struct ReviewExtractor;

impl ReviewExtractor {
    /// Extracts the page's reviews along with the number of blocks seen
    ///
    /// A block whose rating is not an integer is counted but produces no
    /// review, so a page of unreadable ratings does not look exhausted.
    pub fn extract_page(&self, html: &str) -> ReviewPage {
        let document = Html::parse_document(html);

        let (Ok(text_selector), Ok(rating_selector)) = (
            Selector::parse("div.review-text1"),
            Selector::parse("div.user-reviews-movie-rating"),
        ) else {
            return ReviewPage::default();
        };

        let texts: Vec<String> = document.select(&text_selector).map(stripped_text).collect();
        let ratings: Vec<String> = document
            .select(&rating_selector)
            .map(stripped_text)
            .collect();

        if texts.len() != ratings.len() {
            tracing::debug!(
                "Review page has {} comments but {} ratings; pairing the first {}",
                texts.len(),
                ratings.len(),
                texts.len().min(ratings.len())
            );
        }

        let blocks = texts.len().min(ratings.len());
        let reviews = texts
            .into_iter()
            .zip(ratings)
            .filter_map(|(text, rating)| match rating.parse::<i32>() {
                Ok(rating) => Some(RawReview { text, rating }),
                Err(_) => {
                    tracing::warn!("Dropping review with unreadable rating '{}'", rating);
                    None
                }
            })
            .collect();

        ReviewPage { blocks, reviews }
    }
}

impl Extractor for ReviewExtractor {
    type Record = RawReview;

    fn extract(&self, html: &str) -> Vec<RawReview> {
        self.extract_page(html).reviews
    }
}
