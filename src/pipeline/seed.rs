//! Seed stage: load exported venue records into the catalog.

use std::path::Path;

use crate::catalog::{CatalogConnection, ConnectionPool, Connector};
use crate::error::{AppError, Result};
use crate::models::SeedRestaurant;
use crate::pipeline::StageReport;

/// Records written per catalog call.
pub const SEED_BATCH_SIZE: usize = 1000;

/// Read venue records from a JSON array or a JSON Lines file.
pub async fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<SeedRestaurant>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let records = parse_seed_records(&content)?;
    log::info!("Loaded {} venues from {}", records.len(), path.display());
    Ok(records)
}

fn parse_seed_records(content: &str) -> Result<Vec<SeedRestaurant>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| AppError::validation(format!("seed line {}: {}", i + 1, e)))
        })
        .collect()
}

/// Upsert `records` into the catalog in batches.
///
/// A failed batch counts its records as failed; the remaining batches still
/// run unless the catalog is unavailable.
pub async fn run_seed<C>(
    pool: &ConnectionPool<C>,
    records: &[SeedRestaurant],
) -> Result<StageReport>
where
    C: Connector,
    C::Connection: CatalogConnection,
{
    let mut report = StageReport::empty("seed");
    report.total = records.len();

    let mut conn = pool.acquire().await?;
    for batch in records.chunks(SEED_BATCH_SIZE) {
        match conn.upsert_restaurants(batch).await {
            Ok(created) => {
                report.succeeded += batch.len();
                report.created += created;
                log::info!("Upserted {} restaurants so far", report.succeeded);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                report.failed += batch.len();
                log::warn!("Seed batch of {} failed: {}", batch.len(), e);
            }
        }
    }

    log::info!("{}", report);
    Ok(report)
}
