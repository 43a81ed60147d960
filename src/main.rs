//! Pagesift main entry point
//!
//! This is the command-line interface for the Pagesift crawl-and-search engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagesift::config::{load_config_with_hash, Config};
use pagesift::crawler::{self, Coordinator};
use pagesift::output::{load_statistics, print_recent_pages, print_search_results, print_statistics};
use pagesift::search::search;
use pagesift::storage::{open_storage, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Pagesift: a small crawl-and-search engine
///
/// Pagesift fetches queued web pages in small, politely paced batches,
/// stores their text in SQLite, and answers keyword queries with a fixed
/// relevance ranking.
#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(version = "1.0.0")]
#[command(about = "A small crawl-and-search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API
    Serve,

    /// Enqueue the configured seed URLs
    Init,

    /// Add a URL to the crawl queue
    Enqueue {
        /// Absolute http(s) URL
        url: String,
    },

    /// Run crawl batches
    Crawl {
        /// Number of batches to run; stops early once the queue is empty
        #[arg(long, default_value_t = 1)]
        batches: u32,
    },

    /// Search the indexed pages
    Search {
        /// Query terms
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results (defaults to the configured limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show index and queue statistics
    Stats,

    /// List recently crawled pages
    Pages {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Serve => pagesift::server::serve(config).await?,
        Command::Init => handle_init(&config)?,
        Command::Enqueue { url } => handle_enqueue(&config, &url)?,
        Command::Crawl { batches } => handle_crawl(config, batches).await?,
        Command::Search { query, limit } => handle_search(&config, &query.join(" "), limit)?,
        Command::Stats => handle_stats(&config)?,
        Command::Pages { limit } => handle_pages(&config, limit)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagesift=info,warn"),
            1 => EnvFilter::new("pagesift=debug,info"),
            2 => EnvFilter::new("pagesift=trace,debug"),
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

/// Opens the configured database and releases entries left in `processing`
fn open_initialized(config: &Config) -> anyhow::Result<SqliteStorage> {
    let mut storage = open_storage(Path::new(&config.storage.database_path))
        .with_context(|| format!("failed to open {}", config.storage.database_path))?;
    crawler::initialize(&mut storage)?;
    Ok(storage)
}

fn handle_init(config: &Config) -> anyhow::Result<()> {
    let mut storage = open_initialized(config)?;
    let created = crawler::seed_queue(&mut storage, &config.crawler.seeds)?;

    println!(
        "✓ Seeded {} new URLs ({} configured)",
        created,
        config.crawler.seeds.len()
    );
    Ok(())
}

fn handle_enqueue(config: &Config, url: &str) -> anyhow::Result<()> {
    let mut storage = open_initialized(config)?;
    let outcome = crawler::enqueue(&mut storage, url)?;

    if outcome.created {
        println!("✓ Queued {}", outcome.url);
    } else {
        println!("✓ {} is already queued", outcome.url);
    }
    Ok(())
}

async fn handle_crawl(config: Config, batches: u32) -> anyhow::Result<()> {
    let mut coordinator = Coordinator::open(config)?;
    let mut completed = 0;

    for batch in 1..=batches {
        let report = coordinator.run_batch().await?;
        tracing::info!("Batch {}/{} done", batch, batches);
        completed += report.completed;

        if report.processed == 0 {
            tracing::info!("Crawl queue is empty");
            break;
        }
    }

    println!("✓ Crawled {} pages", completed);
    Ok(())
}

fn handle_search(config: &Config, query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let limit = limit.unwrap_or(config.search.default_limit);

    let results = search(&storage, query, limit)?;
    print_search_results(query, &results);
    Ok(())
}

/// Shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);
    Ok(())
}

fn handle_pages(config: &Config, limit: usize) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let pages = storage.list_recent_pages(limit)?;
    print_recent_pages(&pages);
    Ok(())
}
