//! URL handling module for Pagesift
//!
//! Crawl requests are validated here before they reach the queue.

mod validate;

pub use validate::validate_crawl_url;
