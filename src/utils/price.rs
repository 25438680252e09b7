// src/utils/price.rs

//! Localized price parsing.

use std::sync::LazyLock;

use regex::Regex;

/// A euro amount as written on Dutch menus: `€ 9,50`, `€12.00`, `€7`.
pub static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"€\s?\d{1,3}(?:[.,]\d{2})?").expect("valid price pattern"));

/// First currency amount in `text`, if any.
pub fn find_price(text: &str) -> Option<&str> {
    PRICE_PATTERN.find(text).map(|m| m.as_str())
}

/// Convert a price string such as `"€ 9,50"` or `"12.00"` to cents.
///
/// A comma is read as the decimal separator. Without any separator the
/// number is taken as whole euros, so `"1050"` is 1050 euros, not 10.50.
/// Returns `None` for empty input, more than one separator, or overflow.
pub fn parse_price(text: &str) -> Option<u64> {
    let stripped = text.trim().replace('€', "").replace("EUR", "");
    let normalized = stripped.trim().replace(',', ".");
    let cleaned: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let Some((whole, fraction)) = cleaned.split_once('.') else {
        return cleaned.parse::<u64>().ok()?.checked_mul(100);
    };

    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return None;
    }

    let units: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let digits: Vec<u64> = fraction
        .bytes()
        .map(|b| u64::from(b - b'0'))
        .collect();

    let mut cents =
        digits.first().copied().unwrap_or(0) * 10 + digits.get(1).copied().unwrap_or(0);
    // Half-up on the first dropped digit
    if digits.get(2).is_some_and(|d| *d >= 5) {
        cents += 1;
    }

    units.checked_mul(100)?.checked_add(cents)
}
