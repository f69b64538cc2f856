//! Reel-Harvest main entry point
//!
//! This is the command-line interface for the Reel-Harvest review crawler.

use anyhow::Context;
use clap::Parser;
use reel_harvest::config::{resolve_config, Config};
use reel_harvest::crawler::{crawl, plan_resume, user_agent_string};
use reel_harvest::source::Endpoints;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Reel-Harvest: a resumable movie review harvester
///
/// Reel-Harvest walks a year-partitioned movie listing, collects every
/// review of every movie it finds and appends them to CSV stores. An
/// interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "reel-harvest")]
#[command(version)]
#[command(about = "A resumable movie review harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore saved resume positions and start from the first partition
    #[arg(long)]
    fresh: bool,

    /// Validate config and show where the crawl would start without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the stores and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, hash) = resolve_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(hash) = hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.fresh)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_harvest=info,warn"),
            1 => EnvFilter::new("reel_harvest=debug,info"),
            2 => EnvFilter::new("reel_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows where the crawl would start
fn handle_dry_run(config: &Config, fresh: bool) -> anyhow::Result<()> {
    println!("=== Reel-Harvest Dry Run ===\n");

    let endpoints = Endpoints::new(&config.source).context("Invalid base URL")?;
    let partitions = config.source.partitions();

    println!("Source:");
    println!("  Root: {}", endpoints.root());
    println!(
        "  Partitions: {}..={} ({} listing pages)",
        partitions.start(),
        partitions.end(),
        partitions.clone().count()
    );
    println!("  First listing: {}", endpoints.listing_url(*partitions.start())?);

    println!("\nCrawler:");
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout);
    println!(
        "  Pause after rate limit: {}ms",
        config.crawler.rate_limit_pause_ms
    );
    match config.crawler.max_consecutive_rate_limits {
        0 => println!("  Consecutive rate limits tolerated: unlimited"),
        n => println!("  Consecutive rate limits tolerated: {}", n),
    }
    println!("  Fetch covers: {}", config.crawler.fetch_covers);
    println!("  User agent: {}", user_agent_string(&config.user_agent));

    println!("\nOutput:");
    println!("  Movies: {}", config.output.movies_path);
    println!("  Reviews: {}", config.output.reviews_path);
    println!("  Cursor: {}", config.output.cursor_path);

    let plan = plan_resume(
        Path::new(&config.output.reviews_path),
        Path::new(&config.output.cursor_path),
        fresh,
    )
    .context("Failed to read the stores")?;

    println!("\n✓ Configuration is valid");
    println!("✓ Would start with: {}", plan.start);
    if let Some(item_id) = &plan.discard {
        println!("✓ Would discard review rows of item {} first", item_id);
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the stores
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use reel_harvest::output::{load_statistics, print_statistics};

    let stats = load_statistics(&config.output).context("Failed to read the stores")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring saved positions)");
    } else {
        tracing::info!("Starting crawl (will resume if a previous run exists)");
    }

    let stats = crawl(config, fresh).await.context("Crawl failed")?;
    tracing::info!(
        "Crawl completed: {} partitions crawled, {} failed, {} movies, {} reviews written",
        stats.partitions_crawled,
        stats.partitions_failed,
        stats.items_processed,
        stats.reviews_written
    );

    Ok(())
}
