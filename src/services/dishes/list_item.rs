//! List items of the form "Name – €12,50".

use scraper::Html;

use super::{HeuristicStrategy, element_text, with_sections};
use crate::models::DishCandidate;
use crate::utils::find_price;

/// Separators between dish name and price, tried in this order.
const SEPARATORS: [&str; 4] = [" – ", " — ", " - ", " : "];

/// Reads priced `<li>` elements, keeping the full text as description.
pub struct ListItemStrategy;

impl HeuristicStrategy for ListItemStrategy {
    fn name(&self) -> &'static str {
        "list-item"
    }

    fn apply(&self, document: &Html) -> Vec<DishCandidate> {
        let mut dishes = Vec::new();

        for (item, section) in with_sections(document, "li") {
            let text = element_text(item);
            let Some(price) = find_price(&text) else {
                continue;
            };

            dishes.extend(DishCandidate::emit(
                dish_name(&text),
                Some(price),
                section.as_deref(),
                Some(&text),
            ));
        }

        dishes
    }
}

/// Text before the first separator, each separator applied in turn.
fn dish_name(text: &str) -> &str {
    SEPARATORS.iter().fold(text, |name, separator| {
        name.split(separator).next().unwrap_or(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNCATEGORIZED;

    #[test]
    fn test_dish_name_separators() {
        assert_eq!(dish_name("Frietjes – €3,50"), "Frietjes");
        assert_eq!(dish_name("Frietjes — €3,50"), "Frietjes");
        assert_eq!(dish_name("Kroket - met brood - €4,00"), "Kroket");
        assert_eq!(dish_name("Koffie : €2,50"), "Koffie");
        assert_eq!(dish_name("Pannenkoek-spek €8,00"), "Pannenkoek-spek €8,00");
    }

    #[test]
    fn test_priced_items_only() {
        let document = Html::parse_document(
            r#"<ul>
                <li>Frietjes – €3,50</li>
                <li>Mayonaise</li>
                <li> </li>
            </ul>"#,
        );

        let dishes = ListItemStrategy.apply(&document);
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].name, "Frietjes");
        assert_eq!(dishes[0].price_cents, Some(350));
        assert_eq!(dishes[0].section, UNCATEGORIZED);
        assert_eq!(dishes[0].description.as_deref(), Some("Frietjes – €3,50"));
    }

    #[test]
    fn test_nested_markup() {
        let document = Html::parse_document(
            r#"<h2>Snacks</h2>
            <ol><li><strong>Kaassoufflé</strong> - <span class="prijs">€ 2,75</span></li></ol>"#,
        );

        let dishes = ListItemStrategy.apply(&document);
        assert_eq!(dishes[0].name, "Kaassoufflé");
        assert_eq!(dishes[0].price_cents, Some(275));
        assert_eq!(dishes[0].section, "Snacks");
    }
}
