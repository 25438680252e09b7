// src/utils/slug.rs

//! URL-safe identifiers derived from display names.

use std::sync::LazyLock;

use regex::Regex;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("valid separator pattern"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").expect("valid disallowed pattern"));
static DASH_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("valid dash pattern"));

/// Lowercase, hyphenated token for a display name.
///
/// Characters outside `a-z`, `0-9` and `-` are removed, not transliterated:
/// `"Café De Hoek"` becomes `"caf-de-hoek"`.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let dashed = SEPARATORS.replace_all(&lowered, "-");
    let cleaned = DISALLOWED.replace_all(&dashed, "");
    DASH_RUNS
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}
