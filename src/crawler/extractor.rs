//! HTML content extractor
//!
//! This module turns a fetched HTML document into the fields stored for a
//! page: title, meta description, meta keywords, and cleaned visible text.
//! Extraction never fails; missing elements fall back to fixed defaults.

use crate::storage::PageContent;
use scraper::{ElementRef, Html, Node, Selector};

/// Maximum stored title length, in characters
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum stored description length, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 300;

/// Maximum stored content length, in characters
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Elements whose text never counts as visible content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style"];

/// Extracts page fields from raw HTML
///
/// # Extraction Rules
///
/// | Field | Source | Fallback | Limit |
/// |-------|--------|----------|-------|
/// | title | first `<title>`, trimmed | the page URL | 200 chars |
/// | description | `<meta name="description" content>` | empty | 300 chars |
/// | keywords | `<meta name="keywords" content>` | empty | none |
/// | content | all text outside `<script>`/`<style>`, `<noscript>` markup stripped, collapsed | empty | 5000 chars |
///
/// # Example
///
/// ```
/// use pagesift::crawler::extract_page;
///
/// let html = r#"<html><head><title> Test </title></head><body><p>Hello</p></body></html>"#;
/// let page = extract_page("https://example.com/", html);
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.description, "");
/// ```
pub fn extract_page(url: &str, html: &str) -> PageContent {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_else(|| url.to_string());
    let description = extract_meta(&document, "description").unwrap_or_default();
    let keywords = extract_meta(&document, "keywords").unwrap_or_default();
    let content = collapse_whitespace(&visible_text(&document));

    PageContent {
        title: truncate_chars(&title, MAX_TITLE_CHARS),
        description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
        keywords,
        content: truncate_chars(&content, MAX_CONTENT_CHARS),
    }
}

/// Extracts the trimmed text of the first `<title>` element
///
/// An empty title element yields `Some("")`; only a missing element falls back.
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Extracts the `content` attribute of the first `<meta name="...">` tag
fn extract_meta(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{}"]"#, name)).ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.value().attr("content").unwrap_or("").to_string())
}

/// Concatenates every text node that is not inside a hidden element
///
/// The parser keeps the body of a `<noscript>` element as raw markup, so that
/// text is parsed again and only its visible text is kept.
fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Node::Text(fragment) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                ElementRef::wrap(ancestor)
                    .map(|element| HIDDEN_ELEMENTS.contains(&element.value().name()))
                    .unwrap_or(false)
            });
            if hidden {
                continue;
            }

            let in_noscript = node
                .parent()
                .and_then(ElementRef::wrap)
                .map(|element| element.value().name() == "noscript")
                .unwrap_or(false);

            if in_noscript {
                text.push_str(&visible_text(&Html::parse_fragment(fragment)));
            } else {
                text.push_str(fragment);
            }
        }
    }

    text
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Collapses raw document text into single-spaced fragments
///
/// Lines are trimmed, then split wherever two spaces appear, and the
/// non-empty trimmed fragments are joined with one space. Single spaces
/// inside a fragment are kept as they are.
pub fn collapse_whitespace(text: &str) -> String {
    text.split(is_line_break)
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keeps at most `max` characters (not bytes) of `s`
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
