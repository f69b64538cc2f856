use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Reel-Harvest
///
/// Every section is optional; a missing section or key falls back to the
/// defaults below, so an empty file describes the stock crawl.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Upstream catalog configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Scheme and host of the catalog site
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Language path segment placed before every page path
    pub language: String,

    /// First partition (release year) to crawl, inclusive
    #[serde(rename = "from-year")]
    pub from_year: i32,

    /// Last partition (release year) to crawl, inclusive
    #[serde(rename = "to-year")]
    pub to_year: i32,

    /// Fixed filter parameters sent with every listing request
    #[serde(rename = "listing-params")]
    pub listing_params: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        let listing_params = [
            ("genres", ""),
            ("chv", "0"),
            ("orderby", "rc"),
            ("movietype", "full|"),
            ("country", ""),
            ("ratingcount", "2"),
            ("runtimemin", "0"),
            ("runtimemax", "7"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            base_url: "https://www.filmaffinity.com".to_string(),
            language: "es".to_string(),
            from_year: 2021,
            to_year: 2024,
            listing_params,
        }
    }
}

impl SourceConfig {
    /// Partitions to crawl, in ascending order
    pub fn partitions(&self) -> std::ops::RangeInclusive<i32> {
        self.from_year..=self.to_year
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Fixed pause before advancing past a rate-limited page (milliseconds)
    #[serde(rename = "rate-limit-pause-ms")]
    pub rate_limit_pause_ms: u64,

    /// Consecutive rate-limited review pages tolerated before an item's
    /// pagination is abandoned. Zero means no limit.
    #[serde(rename = "max-consecutive-rate-limits")]
    pub max_consecutive_rate_limits: u32,

    /// Whether to visit each movie's detail page for its cover link
    #[serde(rename = "fetch-covers")]
    pub fetch_covers: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout: 30,
            connect_timeout: 10,
            rate_limit_pause_ms: 0,
            max_consecutive_rate_limits: 25,
            fetch_covers: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ReelHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the movie (item) CSV store
    #[serde(rename = "movies-path")]
    pub movies_path: String,

    /// Path to the review CSV store
    #[serde(rename = "reviews-path")]
    pub reviews_path: String,

    /// Path to the JSON crawl cursor
    #[serde(rename = "cursor-path")]
    pub cursor_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            movies_path: "movies.csv".to_string(),
            reviews_path: "reviews.csv".to_string(),
            cursor_path: "crawl-cursor.json".to_string(),
        }
    }
}
