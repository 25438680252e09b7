//! Menu Crawler CLI
//!
//! Local execution entry point. The catalog and downloads live under the
//! storage directory.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use menu_crawler::{
    catalog::{ConnectionPool, LocalCatalog, PoolConfig},
    error::Result,
    models::{Config, StageConfig},
    pipeline::{self, StageReport},
    services::RetryPolicy,
    storage::{ContentStore, LocalContentStore},
    utils::http,
};

/// Menu Crawler - restaurant menu discovery and dish extraction
#[derive(Parser, Debug)]
#[command(
    name = "menu-crawler",
    version,
    about = "Discovers restaurant menus and extracts dishes"
)]
struct Cli {
    /// Path to storage directory containing config, catalog and downloads
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for a stage's configured work-list size and concurrency.
#[derive(Args, Debug, Clone, Copy)]
struct StageArgs {
    /// Maximum items to process
    #[arg(long)]
    limit: Option<usize>,

    /// Maximum items in flight
    #[arg(long)]
    concurrency: Option<usize>,
}

impl StageArgs {
    fn apply(self, mut stage: StageConfig) -> StageConfig {
        if let Some(limit) = self.limit {
            stage.limit = limit;
        }
        if let Some(concurrency) = self.concurrency {
            stage.concurrency = concurrency.max(1);
        }
        stage
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load exported venues (JSON array or JSON Lines) into the catalog
    Seed {
        /// Venue export file
        file: PathBuf,
    },

    /// Discover menu links on restaurant websites
    Crawl {
        #[command(flatten)]
        stage: StageArgs,

        /// Re-crawl restaurants that already have menu sources
        #[arg(long)]
        update: bool,
    },

    /// Extract dishes from HTML menu pages
    Extract {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Download menu sources and record checksums
    Download {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Run full pipeline: Seed (optional) → Crawl → Extract
    Pipeline {
        /// Venue export file to seed from first
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Re-crawl restaurants that already have menu sources
        #[arg(long)]
        update: bool,
    },

    /// Validate configuration file
    Validate,

    /// Show catalog info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Content store for downloads: the configured bucket when built with
/// `s3`, otherwise the local download directory.
async fn content_store(config: &Config, storage_dir: &Path) -> Result<Box<dyn ContentStore>> {
    #[cfg(feature = "s3")]
    if let Some(s3) = &config.storage.s3 {
        log::info!("Storing downloads in bucket {}", s3.bucket);
        let store = menu_crawler::storage::S3ContentStore::from_config(s3).await?;
        return Ok(Box::new(store));
    }

    #[cfg(not(feature = "s3"))]
    if config.storage.s3.is_some() {
        return Err(menu_crawler::error::AppError::config(
            "storage.s3 is configured but the s3 feature is not enabled",
        ));
    }

    let dir = storage_dir.join(&config.storage.download_dir);
    log::info!("Storing downloads in {}", dir.display());
    Ok(Box::new(LocalContentStore::new(dir)))
}

fn log_reports(reports: &[StageReport]) {
    for report in reports {
        log::info!("  {}", report);
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Menu Crawler starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK");
        return Ok(());
    }
    config.validate()?;

    let catalog = LocalCatalog::open(config.catalog.path(&cli.storage_dir)).await?;

    if let Command::Info = cli.command {
        let summary = catalog.summary().await;
        log::info!("Storage directory: {}", cli.storage_dir.display());
        log::info!("Restaurants: {} ({} with website)", summary.restaurants, summary.with_website);
        log::info!("Menu sources: {} ({} downloaded)", summary.menus, summary.downloaded);
        log::info!("Dishes: {}", summary.dishes);
        return Ok(());
    }

    let pool = ConnectionPool::new(catalog.clone(), PoolConfig::from(&config.catalog));
    let client = http::create_client(&config.crawler)?;

    let result = match cli.command {
        Command::Seed { file } => match pipeline::load_seed_file(&file).await {
            Ok(records) => pipeline::run_seed(&pool, &records).await.map(|r| vec![r]),
            Err(e) => Err(e),
        },

        Command::Crawl { stage, update } => pipeline::run_crawl(
            &pool,
            &client,
            &config.discovery,
            stage.apply(config.stages.crawl),
            update || config.stages.update_mode,
        )
        .await
        .map(|r| vec![r]),

        Command::Extract { stage } => {
            pipeline::run_extract(&pool, &client, stage.apply(config.stages.extract))
                .await
                .map(|r| vec![r])
        }

        Command::Download { stage } => {
            let store = content_store(&config, &cli.storage_dir).await?;
            pipeline::run_download(
                &pool,
                &client,
                store.as_ref(),
                RetryPolicy::from(&config.fetcher),
                stage.apply(config.stages.download),
            )
            .await
            .map(|r| vec![r])
        }

        Command::Pipeline { seed, update } => {
            config.stages.update_mode |= update;
            let records = match seed {
                Some(file) => Some(pipeline::load_seed_file(&file).await?),
                None => None,
            };
            pipeline::run_pipeline(&pool, &client, &config, records.as_deref()).await
        }

        Command::Validate | Command::Info => Ok(Vec::new()),
    };

    // Keep whatever progress was made, even when a stage aborted
    catalog.save().await?;
    let reports = result?;

    log_reports(&reports);
    log::info!("Done!");

    Ok(())
}
