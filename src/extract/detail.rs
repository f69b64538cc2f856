//! Detail page extraction
//!
//! The only thing taken from a movie's detail page is its cover image link,
//! the `href` of the `a.lightbox` anchor wrapping the poster.

use crate::extract::{resolve_href, Extractor};
use scraper::{Html, Selector};
use url::Url;

/// Extracts the cover link from a movie detail page
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    base_url: Url,
}

impl DetailExtractor {
    /// Creates an extractor resolving relative links against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl Extractor for DetailExtractor {
    type Record = String;

    fn extract(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Ok(selector) = Selector::parse("a.lightbox[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_href(&self.base_url, href))
            .take(1)
            .collect()
    }
}
