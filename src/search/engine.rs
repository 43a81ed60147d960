//! Result assembly
//!
//! Scores every stored page, ranks the matches, and builds the result records.

use crate::search::scorer::score_page;
use crate::search::snippet::create_snippet;
use crate::storage::{PageRecord, Storage};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    /// The page description, or the snippet when the page has none
    pub description: String,
    pub snippet: String,
    pub score: u32,
    pub crawled_at: Option<DateTime<Utc>>,
}

impl SearchResult {
    fn from_page(page: PageRecord, query: &str, score: u32) -> Self {
        let snippet = create_snippet(&page.content, query);
        let description = if page.description.is_empty() {
            snippet.clone()
        } else {
            page.description
        };

        Self {
            url: page.url,
            title: page.title,
            description,
            snippet,
            score,
            crawled_at: page.crawled_at,
        }
    }
}

/// Searches the stored pages
///
/// Returns at most `limit` results ordered by descending score. Equal
/// scores rank the more recently crawled page first, then keep storage
/// order. A blank query returns no results without reading storage.
///
/// # Arguments
///
/// * `storage` - Page store to scan
/// * `query` - Free-text query, split on whitespace
/// * `limit` - Maximum number of results
///
/// # Returns
///
/// * `Ok(Vec<SearchResult>)` - Ranked results, possibly empty
/// * `Err(SiftError)` - Failed to read pages
pub fn search(
    storage: &dyn Storage,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(u32, PageRecord)> = storage
        .list_pages()?
        .into_iter()
        .filter_map(|page| {
            let score = score_page(query, &page);
            (score > 0).then_some((score, page))
        })
        .collect();

    scored.sort_by(|(score_a, page_a), (score_b, page_b)| {
        score_b
            .cmp(score_a)
            .then_with(|| page_b.crawled_at.cmp(&page_a.crawled_at))
    });
    scored.truncate(limit);

    tracing::debug!("Query {:?} matched {} pages", query, scored.len());

    Ok(scored
        .into_iter()
        .map(|(score, page)| SearchResult::from_page(page, query, score))
        .collect())
}
