//! Extract stage: read dishes out of HTML menu pages.

use crate::catalog::{CatalogConnection, ConnectionPool, Connector};
use crate::error::{AppError, Result};
use crate::models::{MenuPage, StageConfig};
use crate::pipeline::{StageReport, run_stage};
use crate::services::DishExtractor;
use crate::utils::http::{Transport, fetch_html};
use crate::utils::slugify;

/// Extract dishes for HTML menu sources that have none yet.
///
/// Pages that answer with a rejecting status or with something other than
/// HTML yield no dishes. The report counts newly created dishes.
pub async fn run_extract<C>(
    pool: &ConnectionPool<C>,
    transport: &dyn Transport,
    stage: StageConfig,
) -> Result<StageReport>
where
    C: Connector,
    C::Connection: CatalogConnection,
{
    let pages = {
        let mut conn = pool.acquire().await?;
        conn.menus_without_dishes(stage.limit).await?
    };

    let extractor = DishExtractor::default();
    let extractor = &extractor;

    let outcome = run_stage("extract", pages, stage.concurrency, move |page| async move {
        extract_menu(pool, transport, extractor, page).await
    })
    .await?;

    let report = outcome.report("extract", outcome.succeeded.iter().sum());
    log::info!("{}", report);
    Ok(report)
}

async fn extract_menu<C>(
    pool: &ConnectionPool<C>,
    transport: &dyn Transport,
    extractor: &DishExtractor,
    page: MenuPage,
) -> Result<usize>
where
    C: Connector,
    C::Connection: CatalogConnection,
{
    let html = match fetch_html(transport, &page.url).await {
        Ok(html) => html,
        Err(e @ (AppError::Status { .. } | AppError::NotHtml { .. })) => {
            log::debug!("No dishes for menu {}: {}", page.menu_id, e);
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    let dishes = extractor.extract(&html);
    if dishes.is_empty() {
        return Ok(0);
    }

    let mut conn = pool.acquire().await?;
    let mut created = 0;
    for dish in &dishes {
        let slug = slugify(&dish.name);
        if slug.is_empty() {
            log::debug!("Skipping dish without slug: {:?}", dish.name);
            continue;
        }
        let (_, is_new) = conn.upsert_dish(&page.menu_id, &slug, dish).await?;
        if is_new {
            created += 1;
        }
    }

    log::debug!(
        "Menu {} ({}): {} dishes, {} new",
        page.menu_id,
        page.url,
        dishes.len(),
        created
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LocalCatalog, PoolConfig};
    use crate::models::{MenuSourceCandidate, SeedRestaurant, SourceKind, UNCATEGORIZED};
    use crate::testing::FakeTransport;

    async fn catalog_with_menus(urls: &[&str]) -> (LocalCatalog, ConnectionPool<LocalCatalog>) {
        let catalog = LocalCatalog::in_memory();
        let pool = ConnectionPool::new(catalog.clone(), PoolConfig::default());
        {
            let mut conn = pool.acquire().await.unwrap();
            conn.upsert_restaurants(&[SeedRestaurant {
                osm_id: "node/1".into(),
                name: "Snackbar".into(),
                city: Some("Zwolle".into()),
                address: None,
                website_url: Some("http://r.test/".into()),
                lat: 52.5,
                lon: 6.1,
            }])
            .await
            .unwrap();
            let restaurant = conn.restaurants_needing_crawl(1, true).await.unwrap()[0]
                .id
                .clone();
            for url in urls {
                let candidate = MenuSourceCandidate {
                    url: url.to_string(),
                    kind: SourceKind::Page,
                };
                conn.ensure_menu_source(&restaurant, &candidate).await.unwrap();
            }
        }
        (catalog, pool)
    }

    fn stage() -> StageConfig {
        StageConfig {
            concurrency: 2,
            limit: 10,
        }
    }

    #[tokio::test]
    async fn test_extract_stores_dishes() {
        let (catalog, pool) =
            catalog_with_menus(&["http://r.test/menukaart", "http://r.test/gone"]).await;
        let transport = FakeTransport::new().page(
            "http://r.test/menukaart",
            r#"<ul>
                <li>Frietjes – €3,50</li>
                <li>Kroket - €2,25</li>
                <li>!!! - €1,00</li>
            </ul>"#,
        );

        let report = run_extract(&pool, &transport, stage()).await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.created, 2);

        let dishes = catalog.dishes().await;
        assert_eq!(dishes[0].slug, "frietjes");
        assert_eq!(dishes[0].price_cents, Some(350));
        assert_eq!(dishes[0].section, UNCATEGORIZED);
        assert_eq!(dishes[1].slug, "kroket");
    }

    #[tokio::test]
    async fn test_transport_errors_count_as_failures() {
        let (_catalog, pool) = catalog_with_menus(&["http://r.test/menu"]).await;
        let transport = FakeTransport::new()
            .page("http://r.test/menu", "<li>Soep - €5,00</li>")
            .fail_first("http://r.test/menu", 1);

        let report = run_extract(&pool, &transport, stage()).await.unwrap();
        assert_eq!(report.failed, 1);

        // The menu is still without dishes and is picked up again
        let report = run_extract(&pool, &transport, stage()).await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.created, 1);
    }
}
