//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Crawl queue enqueueing and batch processing
//! - HTTP fetching with a fixed timeout
//! - HTML text and metadata extraction

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{enqueue, initialize, seed_queue, BatchReport, Coordinator, EnqueueOutcome};
pub use extractor::{collapse_whitespace, extract_page, truncate_chars};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
