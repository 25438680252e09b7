//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Menu link discovery rules
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Per-stage concurrency and work-list limits
    #[serde(default)]
    pub stages: StagesConfig,

    /// Download retry behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Content store for downloaded menu sources
    #[serde(default)]
    pub storage: StorageConfig,

    /// Catalog location and connection pool
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        for (name, stage) in [
            ("crawl", &self.stages.crawl),
            ("extract", &self.stages.extract),
            ("download", &self.stages.download),
        ] {
            if stage.concurrency == 0 {
                return Err(AppError::validation(format!(
                    "stages.{name}.concurrency must be > 0"
                )));
            }
        }
        if self.discovery.hint_words.iter().any(|w| w.trim().is_empty()) {
            return Err(AppError::validation(
                "discovery.hint_words must not contain blank entries",
            ));
        }
        if self.catalog.pool_size == 0 {
            return Err(AppError::validation("catalog.pool_size must be > 0"));
        }
        if self.catalog.connect_attempts == 0 {
            return Err(AppError::validation(
                "catalog.connect_attempts must be > 0",
            ));
        }
        if let Some(s3) = &self.storage.s3 {
            if s3.bucket.trim().is_empty() {
                return Err(AppError::validation("storage.s3.bucket is empty"));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            discovery: DiscoveryConfig::default(),
            stages: StagesConfig::default(),
            fetcher: FetcherConfig::default(),
            storage: StorageConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Menu link discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Lowercase words that mark a link as menu-like
    #[serde(default = "defaults::hint_words")]
    pub hint_words: Vec<String>,

    /// How many characters of page text are scanned for prices
    #[serde(default = "defaults::body_scan_chars")]
    pub body_scan_chars: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            hint_words: defaults::hint_words(),
            body_scan_chars: defaults::body_scan_chars(),
        }
    }
}

/// Concurrency and work-list size for one pipeline stage.
///
/// A missing stage table takes that stage's defaults; a field missing from
/// a present table takes the shared stage default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StageConfig {
    /// Maximum items processed at the same time
    #[serde(default = "defaults::stage_concurrency")]
    pub concurrency: usize,

    /// Maximum items pulled from the catalog per run
    #[serde(default = "defaults::stage_limit")]
    pub limit: usize,
}

/// Settings for all pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesConfig {
    #[serde(default = "defaults::crawl_stage")]
    pub crawl: StageConfig,

    #[serde(default = "defaults::extract_stage")]
    pub extract: StageConfig,

    #[serde(default = "defaults::download_stage")]
    pub download: StageConfig,

    /// Re-crawl restaurants that already have menu sources
    #[serde(default)]
    pub update_mode: bool,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            crawl: defaults::crawl_stage(),
            extract: defaults::extract_stage(),
            download: defaults::download_stage(),
            update_mode: false,
        }
    }
}

/// Retry behavior of the content fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Additional attempts after the first failed one
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled on each attempt
    #[serde(default = "defaults::backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Linear jitter added per attempt index
    #[serde(default = "defaults::jitter_step_ms")]
    pub jitter_step_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            backoff_base_ms: defaults::backoff_base_ms(),
            jitter_step_ms: defaults::jitter_step_ms(),
        }
    }
}

/// Where downloaded menu sources are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local download directory, relative to the storage dir
    #[serde(default = "defaults::download_dir")]
    pub download_dir: String,

    /// Remote object storage; takes precedence when the `s3` feature is enabled
    #[serde(default)]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: defaults::download_dir(),
            s3: None,
        }
    }
}

/// S3-compatible bucket settings (AWS S3, Cloudflare R2, MinIO).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,

    /// Custom endpoint for non-AWS providers
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Public base URL used to build object locators
    #[serde(default)]
    pub public_base_url: Option<String>,
}

/// Catalog file and connection pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog file, relative to the storage dir
    #[serde(default = "defaults::catalog_file")]
    pub file: String,

    /// Maximum open catalog connections
    #[serde(default = "defaults::pool_size")]
    pub pool_size: usize,

    /// Connection attempts before the catalog is declared unavailable
    #[serde(default = "defaults::connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "defaults::connect_backoff_ms")]
    pub connect_backoff_ms: u64,

    #[serde(default = "defaults::connect_backoff_cap_ms")]
    pub connect_backoff_cap_ms: u64,
}

impl CatalogConfig {
    /// Catalog file path under the given storage directory.
    pub fn path(&self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(&self.file)
    }

    pub fn connect_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_ms)
    }

    pub fn connect_backoff_cap(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_cap_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            file: defaults::catalog_file(),
            pool_size: defaults::pool_size(),
            connect_attempts: defaults::connect_attempts(),
            connect_backoff_ms: defaults::connect_backoff_ms(),
            connect_backoff_cap_ms: defaults::connect_backoff_cap_ms(),
        }
    }
}

mod defaults {
    use super::StageConfig;

    // Crawler defaults
    pub fn user_agent() -> String {
        "MenuCrawler/0.1 (+https://example.com/bot-info)".into()
    }
    pub fn timeout() -> u64 {
        12
    }

    // Discovery defaults
    pub fn hint_words() -> Vec<String> {
        [
            "menukaart",
            "menu",
            "kaart",
            "gerechten",
            "dranken",
            "wijn",
            "lunch",
            "diner",
            "eten",
            "spijskaart",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn body_scan_chars() -> usize {
        50_000
    }

    // Stage defaults
    pub fn stage_concurrency() -> usize {
        8
    }
    pub fn stage_limit() -> usize {
        2000
    }
    pub fn crawl_stage() -> StageConfig {
        StageConfig {
            concurrency: 6,
            limit: 5000,
        }
    }
    pub fn extract_stage() -> StageConfig {
        StageConfig {
            concurrency: 8,
            limit: 2000,
        }
    }
    pub fn download_stage() -> StageConfig {
        StageConfig {
            concurrency: 10,
            limit: 2000,
        }
    }

    // Fetcher defaults
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff_base_ms() -> u64 {
        500
    }
    pub fn jitter_step_ms() -> u64 {
        100
    }

    // Storage defaults
    pub fn download_dir() -> String {
        "downloads".into()
    }

    // Catalog defaults
    pub fn catalog_file() -> String {
        "catalog.json".into()
    }
    pub fn pool_size() -> usize {
        6
    }
    pub fn connect_attempts() -> u32 {
        5
    }
    pub fn connect_backoff_ms() -> u64 {
        500
    }
    pub fn connect_backoff_cap_ms() -> u64 {
        5000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.stages.extract.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_pool() {
        let mut config = Config::default();
        config.catalog.pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            timeout_secs = 30

            [stages.crawl]
            concurrency = 2
            limit = 10

            [storage.s3]
            bucket = "menus"
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.crawler.user_agent, defaults::user_agent());
        assert_eq!(config.stages.crawl.concurrency, 2);
        assert_eq!(config.stages.extract.concurrency, 8);
        assert_eq!(config.discovery.body_scan_chars, 50_000);
        assert_eq!(config.storage.s3.unwrap().bucket, "menus");
        assert!(config.discovery.hint_words.contains(&"menukaart".to_string()));
    }

    #[test]
    fn partial_stage_table_keeps_rest_of_config() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            timeout_secs = 45

            [stages.crawl]
            concurrency = 3

            [stages.download]
            limit = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.timeout_secs, 45);
        assert_eq!(config.stages.crawl.concurrency, 3);
        assert_eq!(config.stages.crawl.limit, defaults::stage_limit());
        assert_eq!(config.stages.download.limit, 50);
        assert_eq!(config.stages.download.concurrency, defaults::stage_concurrency());
        assert_eq!(config.stages.extract.limit, 2000);
        assert!(config.validate().is_ok());
    }
}
