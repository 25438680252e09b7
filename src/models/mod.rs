// src/models/mod.rs

//! Domain models for the menu crawler.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod dish;
mod menu;
mod restaurant;

// Re-export all public types
pub use config::{
    CatalogConfig, Config, CrawlerConfig, DiscoveryConfig, FetcherConfig, S3Config, StageConfig,
    StagesConfig, StorageConfig,
};
pub use dish::{DishCandidate, UNCATEGORIZED};
pub use menu::{DownloadResult, MenuPage, MenuSourceCandidate, PendingDownload, SourceKind};
pub use restaurant::{CrawlTarget, SeedRestaurant};
