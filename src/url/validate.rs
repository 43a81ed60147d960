use crate::{UrlError, UrlResult};
use url::Url;

/// Validates a URL submitted for crawling and returns its normalized form
///
/// # Validation Rules
///
/// 1. Surrounding whitespace is ignored
/// 2. The URL must parse as an absolute URL
/// 3. The scheme must be `http` or `https`
/// 4. A non-empty host must be present
///
/// Normalization is whatever `Url` serialization does: the scheme and host
/// are lowercased and an empty path becomes `/`. Nothing else is rewritten,
/// so query strings and fragments are kept as submitted.
///
/// # Examples
///
/// ```
/// use pagesift::url::validate_crawl_url;
///
/// let url = validate_crawl_url("HTTPS://Example.COM").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// ```
pub fn validate_crawl_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}
