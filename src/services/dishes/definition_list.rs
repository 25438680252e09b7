//! Definition lists: `<dt>` holds the dish, `<dd>` its description and price.

use scraper::{Html, Selector};

use super::{HeuristicStrategy, element_text, with_sections};
use crate::models::DishCandidate;
use crate::utils::find_price;

/// Pairs the n-th `<dt>` of a list with its n-th `<dd>`.
pub struct DefinitionListStrategy;

impl HeuristicStrategy for DefinitionListStrategy {
    fn name(&self) -> &'static str {
        "definition-list"
    }

    fn apply(&self, document: &Html) -> Vec<DishCandidate> {
        let (Ok(term_selector), Ok(detail_selector)) =
            (Selector::parse("dt"), Selector::parse("dd"))
        else {
            return Vec::new();
        };

        let mut dishes = Vec::new();
        for (list, section) in with_sections(document, "dl") {
            let terms = list.select(&term_selector);
            let details = list.select(&detail_selector);

            for (term, detail) in terms.zip(details) {
                let description = element_text(detail);
                dishes.extend(DishCandidate::emit(
                    &element_text(term),
                    find_price(&description),
                    section.as_deref(),
                    Some(&description),
                ));
            }
        }

        dishes
    }
}
