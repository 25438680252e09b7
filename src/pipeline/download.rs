//! Download stage: fetch menu sources and record their checksums.

use crate::catalog::{CatalogConnection, ConnectionPool, Connector};
use crate::error::Result;
use crate::models::StageConfig;
use crate::pipeline::{StageReport, run_stage};
use crate::services::{ContentFetcher, RetryPolicy};
use crate::storage::ContentStore;
use crate::utils::http::Transport;

/// Download menu sources that have no checksum yet.
///
/// Checksums of all successful downloads are recorded in one catalog call
/// after the batch. The report counts recorded checksums.
pub async fn run_download<C>(
    pool: &ConnectionPool<C>,
    transport: &dyn Transport,
    store: &dyn ContentStore,
    retry: RetryPolicy,
    stage: StageConfig,
) -> Result<StageReport>
where
    C: Connector,
    C::Connection: CatalogConnection,
{
    let pending = {
        let mut conn = pool.acquire().await?;
        conn.menus_needing_download(stage.limit).await?
    };

    let fetcher = ContentFetcher::new(transport, store, retry);
    let fetcher = &fetcher;

    let outcome = run_stage("download", pending, stage.concurrency, move |item| async move {
        log::debug!("GET {} (menu {})", item.url, item.menu_id);
        fetcher.fetch(&item.menu_id, &item.url).await
    })
    .await?;

    let updates: Vec<(String, String)> = outcome
        .succeeded
        .iter()
        .map(|result| (result.checksum.clone(), result.source_id.clone()))
        .collect();

    let recorded = if updates.is_empty() {
        0
    } else {
        let mut conn = pool.acquire().await?;
        conn.record_checksums(&updates).await?
    };

    let report = outcome.report("download", recorded);
    log::info!("{}", report);
    Ok(report)
}
