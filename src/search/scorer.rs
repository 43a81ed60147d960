//! Relevance scoring
//!
//! A page's score is the sum of independent signals computed on its
//! lower-cased fields. Matching is literal substring matching: a term
//! inside a longer word still counts.

use crate::storage::PageRecord;

/// Points for each query term found in the title
pub const TITLE_TERM_POINTS: u32 = 15;

/// Points awarded once when a multi-term query appears verbatim in the title
pub const TITLE_PHRASE_POINTS: u32 = 10;

/// Points for each query term found in the description
pub const DESCRIPTION_TERM_POINTS: u32 = 8;

/// Points for every occurrence of a query term in the content
pub const CONTENT_OCCURRENCE_POINTS: u32 = 2;

/// Points for each query term occurring more than `CONTENT_BURST_THRESHOLD` times
pub const CONTENT_BURST_POINTS: u32 = 5;

/// Occurrence count a term must exceed to earn the burst bonus
pub const CONTENT_BURST_THRESHOLD: usize = 3;

/// Points for each query term found in the keywords
pub const KEYWORDS_TERM_POINTS: u32 = 12;

/// Points for each query term found in the URL
pub const URL_TERM_POINTS: u32 = 5;

/// Splits a query into lower-cased terms on whitespace
///
/// Order and duplicates are kept, so a repeated term scores twice.
pub fn query_terms(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Scores a page against a query
///
/// Returns 0 when nothing matches, including for a query with no terms.
///
/// # Examples
///
/// ```
/// use pagesift::search::score_page;
/// use pagesift::storage::PageRecord;
///
/// let page = PageRecord {
///     id: 1,
///     url: "https://x.com/py".to_string(),
///     title: "Python Tutorial".to_string(),
///     description: String::new(),
///     keywords: String::new(),
///     content: "python python python python code".to_string(),
///     crawled_at: None,
/// };
///
/// assert_eq!(score_page("python", &page), 28);
/// ```
pub fn score_page(query: &str, page: &PageRecord) -> u32 {
    let terms = query_terms(query);
    if terms.is_empty() {
        return 0;
    }

    let title = page.title.to_lowercase();
    let description = page.description.to_lowercase();
    let keywords = page.keywords.to_lowercase();
    let content = page.content.to_lowercase();
    let url = page.url.to_lowercase();

    let mut score: u32 = 0;

    // A single term is never a phrase; its title hit is already counted below
    if terms.len() > 1 && title.contains(query.to_lowercase().as_str()) {
        score = score.saturating_add(TITLE_PHRASE_POINTS);
    }

    for term in &terms {
        let term = term.as_str();

        if title.contains(term) {
            score = score.saturating_add(TITLE_TERM_POINTS);
        }
        if description.contains(term) {
            score = score.saturating_add(DESCRIPTION_TERM_POINTS);
        }
        if keywords.contains(term) {
            score = score.saturating_add(KEYWORDS_TERM_POINTS);
        }
        if url.contains(term) {
            score = score.saturating_add(URL_TERM_POINTS);
        }

        score = score.saturating_add(content_points(content.matches(term).count()));
    }

    score
}

/// Points earned by one term occurring `occurrences` times in the content
///
/// Saturates at `u32::MAX` instead of wrapping.
fn content_points(occurrences: usize) -> u32 {
    let points = u32::try_from(occurrences)
        .unwrap_or(u32::MAX)
        .saturating_mul(CONTENT_OCCURRENCE_POINTS);

    if occurrences > CONTENT_BURST_THRESHOLD {
        points.saturating_add(CONTENT_BURST_POINTS)
    } else {
        points
    }
}
