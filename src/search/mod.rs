//! Search module for keyword queries over stored pages
//!
//! This module contains:
//! - The fixed relevance scorer
//! - Snippet extraction around query terms
//! - Ranking and result assembly

mod engine;
mod scorer;
mod snippet;

pub use engine::{search, SearchResult};
pub use scorer::{query_terms, score_page};
pub use snippet::create_snippet;
