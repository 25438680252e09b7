// src/utils/links.rs

//! Link classification by URL shape and link text.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::SourceKind;

static DOCUMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.pdf($|\?)").expect("valid document pattern"));
static IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(png|jpe?g|webp)($|\?)").expect("valid image pattern"));

/// Structural kind of the resource behind `url`.
pub fn classify(url: &str) -> SourceKind {
    if DOCUMENT_PATTERN.is_match(url) {
        SourceKind::Document
    } else if IMAGE_PATTERN.is_match(url) {
        SourceKind::Image
    } else {
        SourceKind::Page
    }
}

/// Whether a link probably leads to a menu.
///
/// True when link text or href mention a hint word, or when the link
/// points straight at a document or image.
pub fn looks_like_menu(text: &str, href: &str, hint_words: &[String]) -> bool {
    let haystack = format!("{text} {href}").to_lowercase();
    if hint_words
        .iter()
        .any(|word| haystack.contains(&word.to_lowercase()))
    {
        return true;
    }
    DOCUMENT_PATTERN.is_match(&haystack) || IMAGE_PATTERN.is_match(&haystack)
}
