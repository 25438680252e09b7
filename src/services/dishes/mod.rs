//! Heuristic dish extraction from menu pages.
//!
//! Each strategy recognizes one common menu layout. Strategies run in a
//! fixed order and their output is deduplicated, so the first strategy to
//! report a dish wins.

mod definition_list;
mod list_item;
mod table;

pub use definition_list::DefinitionListStrategy;
pub use list_item::ListItemStrategy;
pub use table::TableStrategy;

use std::collections::HashSet;

use scraper::{ElementRef, Html};

use crate::models::DishCandidate;

/// One way of reading dishes out of a parsed document.
pub trait HeuristicStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Dish candidates in document order.
    fn apply(&self, document: &Html) -> Vec<DishCandidate>;
}

/// Runs all heuristics over a document and merges their results.
pub struct DishExtractor {
    strategies: Vec<Box<dyn HeuristicStrategy>>,
}

impl Default for DishExtractor {
    fn default() -> Self {
        let strategies: Vec<Box<dyn HeuristicStrategy>> = vec![
            Box::new(DefinitionListStrategy),
            Box::new(TableStrategy),
            Box::new(ListItemStrategy),
        ];
        Self::new(strategies)
    }
}

impl DishExtractor {
    /// Create an extractor running `strategies` in the given order.
    pub fn new(strategies: Vec<Box<dyn HeuristicStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extract unique dishes from an HTML document.
    ///
    /// Two candidates are the same dish when their lowercased names and
    /// prices match.
    pub fn extract(&self, html: &str) -> Vec<DishCandidate> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut dishes = Vec::new();

        for strategy in &self.strategies {
            let found = strategy.apply(&document);
            log::trace!("{} strategy found {} candidates", strategy.name(), found.len());

            for dish in found {
                if seen.insert(dish.dedupe_key()) {
                    dishes.push(dish);
                }
            }
        }

        dishes
    }
}

/// All elements named `tag`, each with the text of the nearest heading
/// that precedes it in document order.
pub(crate) fn with_sections<'a>(
    document: &'a Html,
    tag: &str,
) -> Vec<(ElementRef<'a>, Option<String>)> {
    let mut heading: Option<String> = None;
    let mut found = Vec::new();

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let name = element.value().name();
        if is_heading(name) {
            heading = Some(heading_text(element));
        } else if name == tag {
            found.push((element, heading.clone()));
        }
    }

    found
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Heading text with surrounding whitespace removed from every text node.
fn heading_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Element text with trimmed text nodes joined by single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
