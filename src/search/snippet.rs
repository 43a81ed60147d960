//! Snippet extraction
//!
//! Picks the 200-character window of a page's content that mentions the most
//! distinct query terms.

use crate::search::scorer::query_terms;

/// Snippet window length, in characters
pub const SNIPPET_CHARS: usize = 200;

/// Distance between candidate window starts, in characters
pub const SNIPPET_STEP: usize = 50;

/// Appended to every non-empty snippet
const ELLIPSIS: &str = "...";

/// Builds a snippet of `content` for `query`
///
/// Candidate windows start at offsets 0, 50, 100, ... strictly below
/// `len - 200`. The first window with the highest number of distinct terms
/// wins; with no hits the snippet starts at offset 0. The chosen window is
/// trimmed and suffixed with `"..."`. Empty content yields an empty snippet.
///
/// # Examples
///
/// ```
/// use pagesift::search::create_snippet;
///
/// assert_eq!(create_snippet("  short text  ", "text"), "short text...");
/// assert_eq!(create_snippet("", "text"), "");
/// ```
pub fn create_snippet(content: &str, query: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = content.chars().collect();
    let mut terms = query_terms(query);
    terms.sort();
    terms.dedup();

    let mut best_start = 0;
    let mut best_hits = 0;

    let last_start = chars.len().saturating_sub(SNIPPET_CHARS);
    for start in (0..last_start).step_by(SNIPPET_STEP) {
        let window = window_text(&chars, start).to_lowercase();
        let hits = terms.iter().filter(|term| window.contains(term.as_str())).count();
        if hits > best_hits {
            best_hits = hits;
            best_start = start;
        }
    }

    let snippet = window_text(&chars, best_start);
    format!("{}{}", snippet.trim(), ELLIPSIS)
}

fn window_text(chars: &[char], start: usize) -> String {
    let end = (start + SNIPPET_CHARS).min(chars.len());
    chars[start..end].iter().collect()
}
