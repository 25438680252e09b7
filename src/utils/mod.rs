//! Utility functions and helpers.

pub mod http;
mod links;
mod price;
mod slug;

pub use links::{classify, looks_like_menu};
pub use price::{PRICE_PATTERN, find_price, parse_price};
pub use slug::slugify;

use url::Url;

/// Resolve `href` against `base` and drop any fragment.
///
/// Returns `None` when the reference cannot be resolved or does not lead
/// to an http(s) resource (`mailto:`, `javascript:`, `tel:`).
pub fn normalize_url(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            normalize_url(&base, "page.html").unwrap().as_str(),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            normalize_url(&base, "/root.html#top").unwrap().as_str(),
            "https://example.com/root.html"
        );
        assert_eq!(
            normalize_url(&base, "https://other.com/x").unwrap().as_str(),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_normalize_url_same_target() {
        let base = Url::parse("http://r.test/").unwrap();
        assert_eq!(normalize_url(&base, "/menu"), normalize_url(&base, "./menu"));
    }

    #[test]
    fn test_normalize_url_rejects_non_http() {
        let base = Url::parse("http://r.test/").unwrap();
        assert!(normalize_url(&base, "mailto:menu@r.test").is_none());
        assert!(normalize_url(&base, "javascript:void(0)").is_none());
    }
}
