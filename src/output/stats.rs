//! Statistics generation from the harvest stores
//!
//! This module reads the item store, the review store and the crawl cursor
//! without modifying them, and summarises what has been harvested so far.

use crate::config::OutputConfig;
use crate::store::{CrawlCursor, CursorStore};
use crate::HarvestError;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestStatistics {
    /// Rows in the item store (metadata may repeat across fresh runs)
    pub movie_rows: u64,

    /// Distinct item ids in the item store
    pub unique_movies: u64,

    /// Item store rows that carry a cover link
    pub movies_with_cover: u64,

    /// Item store rows per partition
    pub movies_by_partition: BTreeMap<i32, u64>,

    /// Rows in the review store
    pub review_rows: u64,

    /// Distinct items with at least one review row
    pub reviewed_movies: u64,

    /// Review rows labelled 1
    pub positive_reviews: u64,

    /// Review rows labelled 0
    pub negative_reviews: u64,

    /// Saved crawl cursor, if any
    pub cursor: Option<CrawlCursor>,
}

/// Loads statistics from the configured stores
///
/// Missing stores count as empty.
///
/// # Arguments
///
/// * `output` - Paths of the stores to read
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - A store exists but could not be read
pub fn load_statistics(output: &OutputConfig) -> Result<HarvestStatistics, HarvestError> {
    let mut stats = HarvestStatistics::default();

    let movies_path = Path::new(&output.movies_path);
    if movies_path.exists() {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(movies_path)?;
        let mut ids = HashSet::new();
        for record in reader.records() {
            let record = record?;
            stats.movie_rows += 1;
            if let Some(id) = record.get(2) {
                ids.insert(id.to_string());
            }
            if let Some(partition) = record.get(3).and_then(|p| p.parse::<i32>().ok()) {
                *stats.movies_by_partition.entry(partition).or_insert(0) += 1;
            }
            if record.get(4).is_some_and(|cover| !cover.is_empty()) {
                stats.movies_with_cover += 1;
            }
        }
        stats.unique_movies = ids.len() as u64;
    }

    let reviews_path = Path::new(&output.reviews_path);
    if reviews_path.exists() {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(reviews_path)?;
        let mut ids = HashSet::new();
        for record in reader.records() {
            let record = record?;
            stats.review_rows += 1;
            if let Some(id) = record.get(0) {
                ids.insert(id.to_string());
            }
            match record.get(2) {
                Some("1") => stats.positive_reviews += 1,
                Some("0") => stats.negative_reviews += 1,
                _ => {}
            }
        }
        stats.reviewed_movies = ids.len() as u64;
    }

    stats.cursor = CursorStore::load(Path::new(&output.cursor_path))?;

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Movies:");
    println!("  Rows: {}", stats.movie_rows);
    println!("  Unique movies: {}", stats.unique_movies);
    println!("  With cover link: {}", stats.movies_with_cover);
    for (partition, count) in &stats.movies_by_partition {
        println!("  {}: {}", partition, count);
    }
    println!();

    println!("Reviews:");
    println!("  Rows: {}", stats.review_rows);
    println!("  Movies with reviews: {}", stats.reviewed_movies);
    let positive_share = if stats.review_rows > 0 {
        (stats.positive_reviews as f64 / stats.review_rows as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "  Positive: {} ({:.1}%)",
        stats.positive_reviews, positive_share
    );
    println!("  Negative: {}", stats.negative_reviews);
    println!();

    println!("Cursor:");
    match &stats.cursor {
        Some(cursor) => {
            println!(
                "  Last completed: {}",
                cursor.last_completed_item_id.as_deref().unwrap_or("-")
            );
            println!(
                "  In progress: {}",
                cursor.in_progress_item_id.as_deref().unwrap_or("-")
            );
            if let Some(updated) = cursor.updated_at {
                println!("  Updated: {}", updated.to_rfc3339());
            }
        }
        None => println!("  none (next run resumes from the review store)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn output_in(dir: &TempDir) -> OutputConfig {
        OutputConfig {
            movies_path: dir.path().join("movies.csv").display().to_string(),
            reviews_path: dir.path().join("reviews.csv").display().to_string(),
            cursor_path: dir.path().join("cursor.json").display().to_string(),
        }
    }

    #[test]
    fn test_statistics_for_missing_stores() {
        let dir = TempDir::new().unwrap();
        let stats = load_statistics(&output_in(&dir)).unwrap();

        assert_eq!(stats, HarvestStatistics::default());
    }

    #[test]
    fn test_statistics_counts_rows_and_labels() {
        let dir = TempDir::new().unwrap();
        let output = output_in(&dir);
        fs::write(
            &output.movies_path,
            "Title,Link,Id,Partition,CoverLink\n\
             A,http://x/film1.html,1,2021,http://img/1.jpg\n\
             B,http://x/film2.html,2,2021,\n\
             C,http://x/film3.html,3,2022,\n\
             A,http://x/film1.html,1,2021,http://img/1.jpg\n",
        )
        .unwrap();
        fs::write(
            &output.reviews_path,
            "Id,Comment,Label\n1,good,1\n1,bad,0\n3,fine,1\n",
        )
        .unwrap();
        fs::write(
            &output.cursor_path,
            r#"{"last_completed_item_id":"3","in_progress_item_id":null,"updated_at":null}"#,
        )
        .unwrap();

        let stats = load_statistics(&output).unwrap();

        assert_eq!(stats.movie_rows, 4);
        assert_eq!(stats.unique_movies, 3);
        assert_eq!(stats.movies_with_cover, 2);
        assert_eq!(stats.movies_by_partition.get(&2021), Some(&3));
        assert_eq!(stats.movies_by_partition.get(&2022), Some(&1));
        assert_eq!(stats.review_rows, 3);
        assert_eq!(stats.reviewed_movies, 2);
        assert_eq!(stats.positive_reviews, 2);
        assert_eq!(stats.negative_reviews, 1);
        assert_eq!(
            stats.cursor.and_then(|c| c.last_completed_item_id).as_deref(),
            Some("3")
        );
    }
}
