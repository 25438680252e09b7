//! Pipeline entry points for crawler operations.
//!
//! - `run_seed`: Load exported venues into the catalog
//! - `run_crawl`: Discover menu sources on restaurant websites
//! - `run_extract`: Extract dishes from HTML menu pages
//! - `run_download`: Download menu sources and record checksums
//! - `run_pipeline`: Seed (optional), crawl and extract in sequence

mod crawl;
mod download;
mod extract;
mod runner;
mod seed;

pub use crawl::run_crawl;
pub use download::run_download;
pub use extract::run_extract;
pub use runner::{StageOutcome, StageReport, run_stage};
pub use seed::{SEED_BATCH_SIZE, load_seed_file, run_seed};

use crate::catalog::{CatalogConnection, ConnectionPool, Connector};
use crate::error::Result;
use crate::models::{Config, SeedRestaurant};
use crate::utils::http::Transport;

/// Run the full pipeline: seed when records are given, then crawl, then extract.
///
/// Downloads are not part of the pipeline and run on their own.
pub async fn run_pipeline<C>(
    pool: &ConnectionPool<C>,
    transport: &dyn Transport,
    config: &Config,
    seed: Option<&[SeedRestaurant]>,
) -> Result<Vec<StageReport>>
where
    C: Connector,
    C::Connection: CatalogConnection,
{
    let total_steps = if seed.is_some() { 3 } else { 2 };
    let mut step = 1;
    let mut reports = Vec::with_capacity(total_steps);

    if let Some(records) = seed {
        log::info!("[{}/{}] Seed - Loading venues", step, total_steps);
        reports.push(run_seed(pool, records).await?);
        step += 1;
    }

    log::info!("[{}/{}] Crawl - Discovering menu links", step, total_steps);
    reports.push(
        run_crawl(
            pool,
            transport,
            &config.discovery,
            config.stages.crawl,
            config.stages.update_mode,
        )
        .await?,
    );
    step += 1;

    log::info!("[{}/{}] Extract - Reading dishes from HTML menus", step, total_steps);
    reports.push(run_extract(pool, transport, config.stages.extract).await?);

    log::info!("Pipeline complete");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LocalCatalog, PoolConfig};
    use crate::testing::FakeTransport;

    fn venue() -> SeedRestaurant {
        SeedRestaurant {
            osm_id: "node/42".into(),
            name: "Cafetaria Het Hoekje".into(),
            city: Some("Utrecht".into()),
            address: Some("Oudegracht 1, Utrecht".into()),
            website_url: Some("http://r.test/".into()),
            lat: 52.09,
            lon: 5.12,
        }
    }

    #[tokio::test]
    async fn test_pipeline_end_to_end() {
        let catalog = LocalCatalog::in_memory();
        let pool = ConnectionPool::new(catalog.clone(), PoolConfig::default());
        let transport = FakeTransport::new()
            .page(
                "http://r.test/",
                r#"<nav><a href="/menukaart">Menukaart</a><a href="/over-ons">Over ons</a></nav>"#,
            )
            .page(
                "http://r.test/menukaart",
                "<h2>Snacks</h2><ul><li>Frietjes – €3,50</li></ul>",
            );

        let reports = run_pipeline(&pool, &transport, &Config::default(), Some(&[venue()][..]))
            .await
            .unwrap();

        let stages: Vec<_> = reports.iter().map(|r| (r.stage, r.created)).collect();
        assert_eq!(stages, vec![("seed", 1), ("crawl", 1), ("extract", 1)]);

        let menus = catalog.menus().await;
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].source_url, "http://r.test/menukaart");

        let dishes = catalog.dishes().await;
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].name, "Frietjes");
        assert_eq!(dishes[0].price_cents, Some(350));
        assert_eq!(dishes[0].section, "Snacks");
        assert_eq!(dishes[0].menu_id, menus[0].id);
    }

    #[tokio::test]
    async fn test_pipeline_without_seed() {
        let catalog = LocalCatalog::in_memory();
        let pool = ConnectionPool::new(catalog, PoolConfig::default());
        let transport = FakeTransport::new();

        let reports = run_pipeline(&pool, &transport, &Config::default(), None)
            .await
            .unwrap();
        let stages: Vec<_> = reports.iter().map(|r| (r.stage, r.total)).collect();
        assert_eq!(stages, vec![("crawl", 0), ("extract", 0)]);
    }
}
