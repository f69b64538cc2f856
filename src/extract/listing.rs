//! Listing page extraction
//!
//! A listing page holds one `div.mc-title` block per movie. The first link
//! inside the block carries both the title and the detail page URL, and the
//! movie id is the number embedded in that URL (`.../film123456.html`).

use crate::extract::{resolve_href, stripped_text, ExtractionMiss, Extractor};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

lazy_static! {
    /// Detail links end in `film<digits>.html`; the digits are the movie id
    static ref ITEM_ID_PATTERN: Regex =
        Regex::new(r"film(\d+)\.html").expect("Invalid item id regex");
}

/// A movie discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Display title
    pub title: String,

    /// Absolute URL of the movie's detail page
    pub detail_link: String,

    /// Upstream movie id taken from the detail link
    pub item_id: String,
}

/// Extracts movie entries from a listing page
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    base_url: Url,
}

impl ListingExtractor {
    /// Creates an extractor resolving relative links against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

impl Extractor for ListingExtractor {
    type Record = Result<ListingEntry, ExtractionMiss>;

    fn extract(&self, html: &str) -> Vec<Self::Record> {
        let document = Html::parse_document(html);

        let (Ok(block_selector), Ok(link_selector)) =
            (Selector::parse("div.mc-title"), Selector::parse("a"))
        else {
            return Vec::new();
        };

        document
            .select(&block_selector)
            .map(|block| {
                let link = block
                    .select(&link_selector)
                    .next()
                    .and_then(|a| a.value().attr("href").map(|href| (a, href)))
                    .and_then(|(a, href)| {
                        resolve_href(&self.base_url, href).map(|resolved| (a, resolved))
                    });

                let Some((anchor, detail_link)) = link else {
                    return Err(ExtractionMiss::MissingLink {
                        title: stripped_text(block),
                    });
                };

                let item_id = parse_item_id(&detail_link).ok_or_else(|| {
                    ExtractionMiss::MissingId {
                        link: detail_link.clone(),
                    }
                })?;

                Ok(ListingEntry {
                    title: stripped_text(anchor),
                    detail_link,
                    item_id,
                })
            })
            .collect()
    }
}

/// Extracts the movie id from a detail link of the form `film<digits>.html`
///
/// Returns the digits of the first such occurrence, or `None` if the link
/// does not contain one.
pub fn parse_item_id(link: &str) -> Option<String> {
    ITEM_ID_PATTERN
        .captures(link)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str().to_string())
}
