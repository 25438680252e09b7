// src/models/dish.rs

//! Dish candidates produced by the extraction heuristics.

use serde::{Deserialize, Serialize};

use crate::utils::parse_price;

/// Section label for dishes without a usable heading.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A dish found in a menu document, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishCandidate {
    /// Trimmed, never empty
    pub name: String,

    /// Price in cents, absent when no price could be parsed
    pub price_cents: Option<u64>,

    pub section: String,

    #[serde(default)]
    pub description: Option<String>,
}

impl DishCandidate {
    /// Build a candidate from raw heuristic output.
    ///
    /// Returns `None` when the name is blank. An unparseable price stays
    /// absent, a blank section becomes [`UNCATEGORIZED`] and a blank
    /// description is dropped.
    pub fn emit(
        name: &str,
        price_text: Option<&str>,
        section: Option<&str>,
        description: Option<&str>,
    ) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let section = section
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNCATEGORIZED);

        Some(Self {
            name: name.to_string(),
            price_cents: price_text.and_then(parse_price),
            section: section.to_string(),
            description: description
                .filter(|d| !d.trim().is_empty())
                .map(String::from),
        })
    }

    /// Identity used to drop duplicates within one document.
    pub fn dedupe_key(&self) -> (String, Option<u64>) {
        (self.name.to_lowercase(), self.price_cents)
    }
}
