//! Tables with one dish per row.

use scraper::{Html, Selector};

use super::{HeuristicStrategy, element_text, with_sections};
use crate::models::DishCandidate;
use crate::utils::find_price;

/// Reads the rightmost priced cell as price and the first cell of at least
/// two characters whose text differs from it as name.
pub struct TableStrategy;

impl HeuristicStrategy for TableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn apply(&self, document: &Html) -> Vec<DishCandidate> {
        let (Ok(row_selector), Ok(cell_selector)) =
            (Selector::parse("tr"), Selector::parse("td, th"))
        else {
            return Vec::new();
        };

        let mut dishes = Vec::new();
        for (table, section) in with_sections(document, "table") {
            for row in table.select(&row_selector) {
                let cells: Vec<String> = row.select(&cell_selector).map(element_text).collect();

                let Some((price_cell, price)) = cells
                    .iter()
                    .rev()
                    .find_map(|cell| find_price(cell).map(|price| (cell, price)))
                else {
                    continue;
                };

                let name = cells
                    .iter()
                    .find(|cell| *cell != price_cell && cell.chars().count() >= 2);

                if let Some(name) = name {
                    dishes.extend(DishCandidate::emit(
                        name,
                        Some(price),
                        section.as_deref(),
                        None,
                    ));
                }
            }
        }

        dishes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNCATEGORIZED;

    fn names_and_prices(html: &str) -> Vec<(String, Option<u64>)> {
        TableStrategy
            .apply(&Html::parse_document(html))
            .into_iter()
            .map(|d| (d.name, d.price_cents))
            .collect()
    }

    #[test]
    fn test_name_and_price_columns() {
        let dishes = TableStrategy.apply(&Html::parse_document(
            "<table><tr><td>Tosti</td><td>€4,50</td></tr></table>",
        ));
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].name, "Tosti");
        assert_eq!(dishes[0].price_cents, Some(450));
        assert_eq!(dishes[0].section, UNCATEGORIZED);
        assert_eq!(dishes[0].description, None);
    }

    #[test]
    fn test_rows_without_price_are_skipped() {
        let html = r#"<table>
            <tr><th>Gerecht</th><th>Prijs</th></tr>
            <tr><td>Uitsmijter</td><td>€ 9,75</td></tr>
        </table>"#;
        assert_eq!(
            names_and_prices(html),
            vec![("Uitsmijter".to_string(), Some(975))]
        );
    }

    #[test]
    fn test_rightmost_price_wins_and_short_cells_are_not_names() {
        let html = r#"<table>
            <tr><td>1</td><td>Saté</td><td>€ 8,00</td><td>€ 14,00</td></tr>
        </table>"#;
        assert_eq!(names_and_prices(html), vec![("Saté".to_string(), Some(1400))]);
    }

    #[test]
    fn test_cells_repeating_the_price_are_not_names() {
        let html = "<table><tr><td>€3,00</td><td>Kroket</td><td>€3,00</td></tr></table>";
        assert_eq!(names_and_prices(html), vec![("Kroket".to_string(), Some(300))]);

        let html = "<table><tr><td>€ 5,00</td><td>€ 5,00</td></tr></table>";
        assert!(names_and_prices(html).is_empty());
    }

    #[test]
    fn test_price_only_row_has_no_name() {
        let html = "<table><tr><td>€ 5,00</td><td>x</td></tr></table>";
        assert!(names_and_prices(html).is_empty());
    }

    #[test]
    fn test_section_from_heading() {
        let dishes = TableStrategy.apply(&Html::parse_document(
            r#"<h4>Bijgerechten</h4>
            <table><tr><td>Salade</td><td>€3,95</td></tr></table>"#,
        ));
        assert_eq!(dishes[0].section, "Bijgerechten");
    }
}
