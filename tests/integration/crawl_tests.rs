//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small catalog and run the full
//! harvest cycle end-to-end over HTTP.

use reel_harvest::config::Config;
use reel_harvest::crawler::{crawl, CrawlDriver};
use reel_harvest::source::HttpCatalogSource;
use reel_harvest::store::CursorStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.source.base_url = base_url.to_string();
    config.source.from_year = 2021;
    config.source.to_year = 2022;
    config.crawler.request_timeout = 5;
    config.crawler.connect_timeout = 2;
    config.output.movies_path = dir.path().join("movies.csv").display().to_string();
    config.output.reviews_path = dir.path().join("reviews.csv").display().to_string();
    config.output.cursor_path = dir.path().join("crawl-cursor.json").display().to_string();
    config
}

fn listing_html(movies: &[(&str, &str)]) -> String {
    let blocks: String = movies
        .iter()
        .map(|(id, title)| {
            format!(
                r#"<div class="movie-card"><div class="mc-title"><a href="/es/film{}.html">{}</a> (2021)</div></div>"#,
                id, title
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", blocks)
}

fn reviews_html(reviews: &[(&str, u8)]) -> String {
    let blocks: String = reviews
        .iter()
        .map(|(text, rating)| {
            format!(
                r#"<div class="review"><div class="review-text1">{}</div><div class="user-reviews-movie-rating">{}</div></div>"#,
                text, rating
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", blocks)
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serves two partitions: films 100 and 200 in 2021, film 300 in 2022
async fn mount_catalog(server: &MockServer) {
    for (year, movies) in [
        ("2021", listing_html(&[("100", "First Film"), ("200", "Second Film")])),
        ("2022", listing_html(&[("300", "Third Film")])),
    ] {
        Mock::given(method("GET"))
            .and(path("/es/topgen.php"))
            .and(query_param("fromyear", year))
            .and(query_param("toyear", year))
            .respond_with(ResponseTemplate::new(200).set_body_string(movies))
            .mount(server)
            .await;
    }

    mount_html(
        server,
        "/es/film100.html",
        r#"<a class="lightbox" href="/imgs/100-large.jpg"><img src="/imgs/100.jpg"></a>"#
            .to_string(),
    )
    .await;
}

/// Review pages not mounted explicitly are empty, which ends pagination
async fn mount_empty_review_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/es/reviews/\d+/\d+\.html$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(reviews_html(&[])))
        .mount(server)
        .await;
}

fn read_rows(path: &str) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open store");
    reader
        .records()
        .map(|r| {
            r.expect("Failed to read row")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

fn column(rows: &[Vec<String>], index: usize) -> Vec<String> {
    rows.iter().map(|row| row[index].clone()).collect()
}

async fn review_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().starts_with("/es/reviews/"))
        .count()
}

#[tokio::test]
async fn test_full_harvest_cold_start() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    mount_catalog(&mock_server).await;
    mount_html(
        &mock_server,
        "/es/reviews/1/100.html",
        reviews_html(&[("Great movie!", 8), ("Too long; boring.", 3)]),
    )
    .await;
    mount_html(
        &mock_server,
        "/es/reviews/2/100.html",
        reviews_html(&[("Solid (mostly).", 6)]),
    )
    .await;
    mount_html(
        &mock_server,
        "/es/reviews/1/200.html",
        reviews_html(&[("Meh", 5)]),
    )
    .await;
    // Page 1 of film 300 is rate limited; page 2 still gets fetched
    mount_status(&mock_server, "/es/reviews/1/300.html", 429).await;
    mount_html(
        &mock_server,
        "/es/reviews/2/300.html",
        reviews_html(&[("Loved it", 10)]),
    )
    .await;
    mount_empty_review_pages(&mock_server).await;

    let stats = crawl(config.clone(), false)
        .await
        .expect("Crawl should succeed");

    assert_eq!(stats.partitions_crawled, 2);
    assert_eq!(stats.items_processed, 3);
    assert_eq!(stats.reviews_written, 5);
    assert_eq!(stats.review_pages_skipped, 1);

    let movies = read_rows(&config.output.movies_path);
    assert_eq!(column(&movies, 2), vec!["100", "200", "300"]);
    assert_eq!(column(&movies, 0), vec!["First Film", "Second Film", "Third Film"]);
    assert_eq!(column(&movies, 3), vec!["2021", "2021", "2022"]);
    assert_eq!(
        movies[0][1],
        format!("{}/es/film100.html", mock_server.uri())
    );
    assert_eq!(
        movies[0][4],
        format!("{}/imgs/100-large.jpg", mock_server.uri())
    );
    // No detail page for film 200: the cover is simply left empty
    assert_eq!(movies[1][4], "");

    let reviews = read_rows(&config.output.reviews_path);
    assert_eq!(column(&reviews, 0), vec!["100", "100", "100", "200", "300"]);
    assert_eq!(
        column(&reviews, 1),
        vec!["Great movie!", "Too long boring.", "Solid mostly.", "Meh", "Loved it"]
    );
    assert_eq!(column(&reviews, 2), vec!["1", "0", "1", "0", "1"]);

    let cursor = CursorStore::load(Path::new(&config.output.cursor_path))
        .unwrap()
        .expect("Cursor should be written");
    assert_eq!(cursor.last_completed_item_id.as_deref(), Some("300"));
    assert_eq!(cursor.in_progress_item_id, None);
}

#[tokio::test]
async fn test_rerun_after_completion_is_idempotent() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    mount_catalog(&mock_server).await;
    mount_html(
        &mock_server,
        "/es/reviews/1/100.html",
        reviews_html(&[("One", 7)]),
    )
    .await;
    mount_html(
        &mock_server,
        "/es/reviews/1/300.html",
        reviews_html(&[("Two", 2)]),
    )
    .await;
    mount_empty_review_pages(&mock_server).await;

    crawl(config.clone(), false).await.unwrap();
    let movies_before = fs::read_to_string(&config.output.movies_path).unwrap();
    let reviews_before = fs::read_to_string(&config.output.reviews_path).unwrap();
    let requests_before = review_requests(&mock_server).await;

    let stats = crawl(config.clone(), false).await.unwrap();

    assert_eq!(stats.items_skipped, 3);
    assert_eq!(stats.items_processed, 0);
    assert_eq!(review_requests(&mock_server).await, requests_before);
    assert_eq!(fs::read_to_string(&config.output.movies_path).unwrap(), movies_before);
    assert_eq!(fs::read_to_string(&config.output.reviews_path).unwrap(), reviews_before);
}

#[tokio::test]
async fn test_resume_from_legacy_review_store() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &dir);

    // An earlier run stopped while writing film 200; no cursor was kept
    fs::write(
        &config.output.reviews_path,
        "Id,Comment,Label\n100,Old one,1\n200,Partial,0\n",
    )
    .unwrap();

    mount_catalog(&mock_server).await;
    mount_html(
        &mock_server,
        "/es/reviews/1/200.html",
        reviews_html(&[("Fresh A", 9), ("Fresh B", 1)]),
    )
    .await;
    mount_empty_review_pages(&mock_server).await;

    let source = HttpCatalogSource::from_config(&config).unwrap();
    let mut driver = CrawlDriver::new(source, &config, false).unwrap();
    let stats = driver.run().await.unwrap();

    assert_eq!(stats.items_skipped, 1);
    let reviews = read_rows(&config.output.reviews_path);
    assert_eq!(column(&reviews, 0), vec!["100", "200", "200"]);
    assert_eq!(column(&reviews, 1), vec!["Old one", "Fresh A", "Fresh B"]);
    assert_eq!(column(&read_rows(&config.output.movies_path), 2), vec!["200", "300"]);
}

#[tokio::test]
async fn test_server_error_is_isolated_to_one_movie() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.crawler.fetch_covers = false;

    mount_catalog(&mock_server).await;
    mount_html(
        &mock_server,
        "/es/reviews/1/100.html",
        reviews_html(&[("Kept", 8)]),
    )
    .await;
    mount_status(&mock_server, "/es/reviews/2/100.html", 503).await;
    mount_html(
        &mock_server,
        "/es/reviews/3/100.html",
        reviews_html(&[("Never fetched", 8)]),
    )
    .await;
    mount_html(
        &mock_server,
        "/es/reviews/1/200.html",
        reviews_html(&[("Next movie", 4)]),
    )
    .await;
    mount_empty_review_pages(&mock_server).await;

    let stats = crawl(config.clone(), false).await.unwrap();

    assert_eq!(stats.items_incomplete, 1);
    assert_eq!(stats.items_processed, 2);
    let reviews = read_rows(&config.output.reviews_path);
    assert_eq!(column(&reviews, 1), vec!["Kept", "Next movie"]);
    assert!(column(&read_rows(&config.output.movies_path), 4)
        .iter()
        .all(String::is_empty));
}

#[tokio::test]
async fn test_unreadable_ratings_do_not_end_pagination() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.crawler.fetch_covers = false;

    mount_catalog(&mock_server).await;
    mount_html(
        &mock_server,
        "/es/reviews/1/100.html",
        r#"<div class="review-text1">Decimal score</div>
           <div class="user-reviews-movie-rating">7,5</div>"#
            .to_string(),
    )
    .await;
    mount_html(
        &mock_server,
        "/es/reviews/2/100.html",
        reviews_html(&[("Whole score", 9)]),
    )
    .await;
    mount_empty_review_pages(&mock_server).await;

    let stats = crawl(config.clone(), false).await.unwrap();

    assert_eq!(stats.items_processed, 3);
    let reviews = read_rows(&config.output.reviews_path);
    assert_eq!(column(&reviews, 0), vec!["100"]);
    assert_eq!(column(&reviews, 1), vec!["Whole score"]);
}

#[tokio::test]
async fn test_missing_listing_skips_partition() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &dir);
    config.source.to_year = 2023;

    // 2023 has no listing mounted and answers 404
    mount_catalog(&mock_server).await;
    mount_empty_review_pages(&mock_server).await;

    let stats = crawl(config.clone(), false).await.unwrap();

    assert_eq!(stats.partitions_crawled, 2);
    assert_eq!(stats.partitions_failed, 1);
    assert_eq!(read_rows(&config.output.movies_path).len(), 3);
    assert!(read_rows(&config.output.reviews_path).is_empty());
}
