// src/models/restaurant.rs

//! Restaurant records: seed input and crawl targets.

use serde::{Deserialize, Serialize};

use crate::utils::slugify;

/// A restaurant with a known website, read by menu link discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTarget {
    pub id: String,

    /// Display name, used only for log context
    pub name: String,

    /// Homepage URL the crawl starts from
    pub site_url: String,
}

/// One venue from the upstream geodata export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRestaurant {
    /// Geodata identifier such as `node/123456`
    pub osm_id: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl SeedRestaurant {
    /// Catalog identity of this venue.
    ///
    /// Name plus city when the city is known. Otherwise the last six
    /// characters of the geodata id keep same-named venues apart.
    pub fn slug(&self) -> String {
        match self.city.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(city) => slugify(&format!("{}-{}", self.name, city)),
            None => {
                let suffix = if self.osm_id.is_empty() {
                    "unk".to_string()
                } else {
                    let id = self.osm_id.replace('/', "-");
                    let start = id.chars().count().saturating_sub(6);
                    id.chars().skip(start).collect()
                };
                slugify(&format!("{}-unknown-{}", self.name, suffix))
            }
        }
    }

    /// Website URL, ignoring blank values.
    pub fn website(&self) -> Option<&str> {
        self.website_url
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}
