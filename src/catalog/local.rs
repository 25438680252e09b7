//! Local catalog backed by a JSON file.
//!
//! Keeps the whole catalog in memory behind a shared lock. Every connection
//! handed out by the pool sees the same state. [`LocalCatalog::save`]
//! writes it back atomically.
//!
//! ```text
//! {storage_dir}/
//! ├── config.toml
//! ├── catalog.json
//! └── downloads/
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::catalog::{
    CatalogConnection, Connector, DishRecord, MenuRecord, RestaurantRecord, UNKNOWN_CITY,
};
use crate::error::{AppError, Result};
use crate::models::{
    CrawlTarget, DishCandidate, MenuPage, MenuSourceCandidate, PendingDownload, SeedRestaurant,
    SourceKind,
};

/// Serialized catalog contents. Maps are keyed by record id.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogState {
    next_id: u64,
    restaurants: BTreeMap<String, RestaurantRecord>,
    menus: BTreeMap<String, MenuRecord>,
    dishes: BTreeMap<String, DishRecord>,

    #[serde(skip)]
    restaurant_by_slug: HashMap<String, String>,
    #[serde(skip)]
    menu_by_source: HashMap<(String, String), String>,
    #[serde(skip)]
    dish_by_slug: HashMap<(String, String), String>,
}

impl CatalogState {
    /// Rebuild lookup indexes after loading.
    fn reindex(&mut self) {
        self.restaurant_by_slug = self
            .restaurants
            .values()
            .map(|r| (r.slug.clone(), r.id.clone()))
            .collect();
        self.menu_by_source = self
            .menus
            .values()
            .map(|m| ((m.restaurant_id.clone(), m.source_url.clone()), m.id.clone()))
            .collect();
        self.dish_by_slug = self
            .dishes
            .values()
            .map(|d| ((d.menu_id.clone(), d.slug.clone()), d.id.clone()))
            .collect();
    }

    /// Ids sort in creation order.
    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:08}", self.next_id)
    }
}

/// Record counts, shown by the `info` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub restaurants: usize,
    pub with_website: usize,
    pub menus: usize,
    pub downloaded: usize,
    pub dishes: usize,
}

/// In-memory catalog, optionally persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    state: Arc<Mutex<CatalogState>>,
    path: Option<PathBuf>,
}

impl LocalCatalog {
    /// A catalog that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(Mutex::new(CatalogState::default())),
            path: None,
        }
    }

    /// Load the catalog at `path`, starting empty when the file is missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<CatalogState>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No catalog at {}, starting empty", path.display());
                CatalogState::default()
            }
            Err(e) => return Err(AppError::Io(e)),
        };
        state.reindex();

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the catalog to its file (write to temp, then rename).
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = {
            let state = self.state.lock().await;
            serde_json::to_vec_pretty(&*state)?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await?;

        log::debug!("Saved catalog to {}", path.display());
        Ok(())
    }

    pub async fn summary(&self) -> CatalogSummary {
        let state = self.state.lock().await;
        CatalogSummary {
            restaurants: state.restaurants.len(),
            with_website: state
                .restaurants
                .values()
                .filter(|r| r.website_url.is_some())
                .count(),
            menus: state.menus.len(),
            downloaded: state.menus.values().filter(|m| m.checksum.is_some()).count(),
            dishes: state.dishes.len(),
        }
    }

    pub async fn restaurants(&self) -> Vec<RestaurantRecord> {
        self.state.lock().await.restaurants.values().cloned().collect()
    }

    pub async fn menus(&self) -> Vec<MenuRecord> {
        self.state.lock().await.menus.values().cloned().collect()
    }

    pub async fn dishes(&self) -> Vec<DishRecord> {
        self.state.lock().await.dishes.values().cloned().collect()
    }
}

#[async_trait]
impl Connector for LocalCatalog {
    type Connection = LocalConnection;

    async fn connect(&self) -> Result<LocalConnection> {
        Ok(LocalConnection {
            state: Arc::clone(&self.state),
        })
    }
}

/// Connection to a [`LocalCatalog`].
pub struct LocalConnection {
    state: Arc<Mutex<CatalogState>>,
}

#[async_trait]
impl CatalogConnection for LocalConnection {
    async fn restaurants_needing_crawl(
        &mut self,
        limit: usize,
        update_mode: bool,
    ) -> Result<Vec<CrawlTarget>> {
        let state = self.state.lock().await;
        let crawled: HashSet<&str> = if update_mode {
            HashSet::new()
        } else {
            state.menus.values().map(|m| m.restaurant_id.as_str()).collect()
        };

        Ok(state
            .restaurants
            .values()
            .filter(|r| !crawled.contains(r.id.as_str()))
            .filter_map(|r| {
                let site_url = r.website_url.as_deref()?.trim();
                (!site_url.is_empty()).then(|| CrawlTarget {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    site_url: site_url.to_string(),
                })
            })
            .take(limit)
            .collect())
    }

    async fn menus_without_dishes(&mut self, limit: usize) -> Result<Vec<MenuPage>> {
        let state = self.state.lock().await;
        let with_dishes: HashSet<&str> =
            state.dishes.values().map(|d| d.menu_id.as_str()).collect();

        Ok(state
            .menus
            .values()
            .filter(|m| m.source_kind == SourceKind::Page)
            .filter(|m| !with_dishes.contains(m.id.as_str()))
            .take(limit)
            .map(|m| MenuPage {
                menu_id: m.id.clone(),
                restaurant_id: m.restaurant_id.clone(),
                url: m.source_url.clone(),
            })
            .collect())
    }

    async fn menus_needing_download(&mut self, limit: usize) -> Result<Vec<PendingDownload>> {
        let state = self.state.lock().await;
        Ok(state
            .menus
            .values()
            .filter(|m| m.checksum.as_deref().is_none_or(str::is_empty))
            .take(limit)
            .map(|m| PendingDownload {
                menu_id: m.id.clone(),
                url: m.source_url.clone(),
            })
            .collect())
    }

    async fn upsert_restaurants(&mut self, records: &[SeedRestaurant]) -> Result<usize> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Utc::now();
        let mut created = 0;

        for seed in records {
            let slug = seed.slug();
            let city = seed
                .city
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(UNKNOWN_CITY)
                .to_string();
            let website_url = seed.website().map(String::from);

            let existing = state.restaurant_by_slug.get(&slug).cloned();
            match existing.and_then(|id| state.restaurants.get_mut(&id)) {
                Some(record) => {
                    record.name = seed.name.clone();
                    record.city = city;
                    record.address = seed.address.clone();
                    if website_url.is_some() {
                        record.website_url = website_url;
                    }
                    record.lat = seed.lat;
                    record.lon = seed.lon;
                    record.updated_at = now;
                }
                None => {
                    let id = state.mint_id();
                    state.restaurant_by_slug.insert(slug.clone(), id.clone());
                    state.restaurants.insert(
                        id.clone(),
                        RestaurantRecord {
                            id,
                            slug,
                            name: seed.name.clone(),
                            city,
                            address: seed.address.clone(),
                            website_url,
                            lat: seed.lat,
                            lon: seed.lon,
                            updated_at: now,
                        },
                    );
                    created += 1;
                }
            }
        }

        Ok(created)
    }

    async fn ensure_menu_source(
        &mut self,
        restaurant_id: &str,
        candidate: &MenuSourceCandidate,
    ) -> Result<(String, bool)> {
        let mut state = self.state.lock().await;
        if !state.restaurants.contains_key(restaurant_id) {
            return Err(AppError::catalog(format!(
                "unknown restaurant {restaurant_id}"
            )));
        }

        let key = (restaurant_id.to_string(), candidate.url.clone());
        if let Some(id) = state.menu_by_source.get(&key) {
            return Ok((id.clone(), false));
        }

        let id = state.mint_id();
        state.menu_by_source.insert(key, id.clone());
        state.menus.insert(
            id.clone(),
            MenuRecord {
                id: id.clone(),
                restaurant_id: restaurant_id.to_string(),
                source_kind: candidate.kind,
                source_url: candidate.url.clone(),
                checksum: None,
                discovered_at: Utc::now(),
            },
        );
        Ok((id, true))
    }

    async fn upsert_dish(
        &mut self,
        menu_id: &str,
        slug: &str,
        dish: &DishCandidate,
    ) -> Result<(String, bool)> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if !state.menus.contains_key(menu_id) {
            return Err(AppError::catalog(format!("unknown menu {menu_id}")));
        }

        let now = Utc::now();
        let key = (menu_id.to_string(), slug.to_string());
        let existing = state.dish_by_slug.get(&key).cloned();

        if let Some(record) = existing.and_then(|id| state.dishes.get_mut(&id)) {
            record.name = dish.name.clone();
            record.description = dish.description.clone();
            record.price_cents = dish.price_cents;
            record.section = dish.section.clone();
            record.updated_at = now;
            return Ok((record.id.clone(), false));
        }

        let id = state.mint_id();
        state.dish_by_slug.insert(key, id.clone());
        state.dishes.insert(
            id.clone(),
            DishRecord {
                id: id.clone(),
                menu_id: menu_id.to_string(),
                slug: slug.to_string(),
                name: dish.name.clone(),
                description: dish.description.clone(),
                price_cents: dish.price_cents,
                section: dish.section.clone(),
                updated_at: now,
            },
        );
        Ok((id, true))
    }

    async fn record_checksums(&mut self, updates: &[(String, String)]) -> Result<usize> {
        let mut state = self.state.lock().await;
        let mut updated = 0;

        for (checksum, menu_id) in updates {
            match state.menus.get_mut(menu_id) {
                Some(menu) => {
                    menu.checksum = Some(checksum.clone());
                    updated += 1;
                }
                None => log::warn!("Checksum for unknown menu {} ignored", menu_id),
            }
        }

        Ok(updated)
    }
}
