//! Crawl stage: discover menu sources on restaurant websites.

use crate::catalog::{CatalogConnection, ConnectionPool, Connector};
use crate::error::Result;
use crate::models::{CrawlTarget, DiscoveryConfig, StageConfig};
use crate::pipeline::{StageReport, run_stage};
use crate::services::MenuLinkFinder;
use crate::utils::http::Transport;

/// Discover menu sources for restaurants that still need a crawl.
///
/// Restaurants that already have menu sources are skipped unless
/// `update_mode` is set. The report counts newly created menu sources.
pub async fn run_crawl<C>(
    pool: &ConnectionPool<C>,
    transport: &dyn Transport,
    discovery: &DiscoveryConfig,
    stage: StageConfig,
    update_mode: bool,
) -> Result<StageReport>
where
    C: Connector,
    C::Connection: CatalogConnection,
{
    let targets = {
        let mut conn = pool.acquire().await?;
        conn.restaurants_needing_crawl(stage.limit, update_mode).await?
    };

    let finder = MenuLinkFinder::new(transport, discovery);
    let finder = &finder;

    let outcome = run_stage("crawl", targets, stage.concurrency, move |target| async move {
        crawl_restaurant(pool, finder, target).await
    })
    .await?;

    let report = outcome.report("crawl", outcome.succeeded.iter().sum());
    log::info!("{}", report);
    Ok(report)
}

async fn crawl_restaurant<C>(
    pool: &ConnectionPool<C>,
    finder: &MenuLinkFinder<'_>,
    target: CrawlTarget,
) -> Result<usize>
where
    C: Connector,
    C::Connection: CatalogConnection,
{
    log::debug!("Fetching menu links for {} ({}) {}", target.name, target.id, target.site_url);
    let candidates = finder.discover(&target.site_url).await;
    if candidates.is_empty() {
        return Ok(0);
    }

    let mut conn = pool.acquire().await?;
    let mut created = 0;
    for candidate in &candidates {
        let (_, is_new) = conn.ensure_menu_source(&target.id, candidate).await?;
        if is_new {
            created += 1;
        }
    }

    log::debug!(
        "{}: {} menu candidates, {} new",
        target.name,
        candidates.len(),
        created
    );
    Ok(created)
}
