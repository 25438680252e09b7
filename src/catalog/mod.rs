//! Catalog of restaurants, menu sources and dishes.
//!
//! Stages read their work lists from the catalog and write their results
//! back through a [`CatalogConnection`]. Connections come from a bounded
//! [`ConnectionPool`] that is built once per run and passed to every stage.

pub mod local;
pub mod pool;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    CrawlTarget, DishCandidate, MenuPage, MenuSourceCandidate, PendingDownload, SeedRestaurant,
    SourceKind,
};

pub use local::{CatalogSummary, LocalCatalog, LocalConnection};
pub use pool::{ConnectionPool, Connector, PoolConfig, PooledConnection};

/// City stored for venues whose city is unknown.
pub const UNKNOWN_CITY: &str = "Unknown";

/// A stored restaurant, identified by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub city: String,
    pub address: Option<String>,
    pub website_url: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub updated_at: DateTime<Utc>,
}

/// A stored menu source, unique per restaurant and URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRecord {
    pub id: String,
    pub restaurant_id: String,
    pub source_kind: SourceKind,
    pub source_url: String,

    /// Set once the source has been downloaded
    #[serde(default)]
    pub checksum: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

/// A stored dish, unique per menu and slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    pub id: String,
    pub menu_id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Option<u64>,
    pub section: String,
    pub updated_at: DateTime<Utc>,
}

/// One open session with the catalog.
#[async_trait]
pub trait CatalogConnection: Send {
    /// Restaurants with a website, in id order. Unless `update_mode` is set,
    /// restaurants that already have a menu source are left out.
    async fn restaurants_needing_crawl(
        &mut self,
        limit: usize,
        update_mode: bool,
    ) -> Result<Vec<CrawlTarget>>;

    /// HTML menu sources without any dish, oldest first.
    async fn menus_without_dishes(&mut self, limit: usize) -> Result<Vec<MenuPage>>;

    /// Menu sources without a checksum, oldest first.
    async fn menus_needing_download(&mut self, limit: usize) -> Result<Vec<PendingDownload>>;

    /// Insert or update restaurants by slug. A missing website never
    /// overwrites a known one. Returns the number of new restaurants.
    async fn upsert_restaurants(&mut self, records: &[SeedRestaurant]) -> Result<usize>;

    /// Menu source id for `(restaurant_id, candidate.url)`, creating it if
    /// needed. The flag tells whether it was created.
    async fn ensure_menu_source(
        &mut self,
        restaurant_id: &str,
        candidate: &MenuSourceCandidate,
    ) -> Result<(String, bool)>;

    /// Insert or update a dish by `(menu_id, slug)`. The flag tells whether
    /// it was created.
    async fn upsert_dish(
        &mut self,
        menu_id: &str,
        slug: &str,
        dish: &DishCandidate,
    ) -> Result<(String, bool)>;

    /// Store `(checksum, menu_id)` pairs. Returns the number of menus updated.
    async fn record_checksums(&mut self, updates: &[(String, String)]) -> Result<usize>;
}
