//! Output module for reports printed by the command line
//!
//! This module handles:
//! - Index and queue statistics
//! - Search result listings
//! - Recently crawled page listings

pub mod stats;

pub use stats::{load_statistics, print_statistics, IndexStatistics};

use crate::search::SearchResult;
use crate::storage::PageRecord;
use chrono::{DateTime, Utc};

fn format_crawled_at(crawled_at: Option<DateTime<Utc>>) -> String {
    crawled_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Prints ranked search results to stdout
pub fn print_search_results(query: &str, results: &[SearchResult]) {
    println!("=== Results for {:?} ({}) ===\n", query, results.len());

    if results.is_empty() {
        println!("No matching pages.");
        return;
    }

    for (rank, result) in results.iter().enumerate() {
        println!("{}. {} [score {}]", rank + 1, result.title, result.score);
        println!("   {}", result.url);
        if !result.description.is_empty() {
            println!("   {}", result.description);
        }
        println!("   Crawled: {}", format_crawled_at(result.crawled_at));
        println!();
    }
}

/// Prints recently crawled pages to stdout
pub fn print_recent_pages(pages: &[PageRecord]) {
    println!("=== Recently Crawled Pages ({}) ===\n", pages.len());

    for page in pages {
        println!("  {}  {}", format_crawled_at(page.crawled_at), page.url);
        if !page.title.is_empty() {
            println!("      {}", page.title);
        }
    }
}
