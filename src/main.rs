use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use newsdesk::config::Config;
use newsdesk::feed::{catalog, HttpFetcher};
use newsdesk::ingest::Ingestor;
use newsdesk::storage::{Database, DatabaseError};

/// Get the config directory path (~/.config/newsdesk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdesk"))
}

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "Fetch news feeds and store new articles")]
struct Args {
    /// Config file (default: ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding `database_path` from the config
    #[arg(long, value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load sources, categories and feeds from a catalog TOML file
    SyncCatalog {
        /// Catalog file (default: `catalog_path` from the config)
        file: Option<PathBuf>,
    },
    /// Ingest every active feed
    IngestAll,
    /// Ingest one feed by ID
    IngestFeed { id: i64 },
    /// Ingest every active feed of one source
    IngestSource { id: i64 },
    /// Print the configured feeds
    ListFeeds,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = args
        .database
        .clone()
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| config_dir.join("news.db"));
    let db = open_database(&db_path).await?;

    match args.command {
        Command::SyncCatalog { file } => {
            let path = file
                .or_else(|| config.catalog_path.clone())
                .unwrap_or_else(|| config_dir.join("catalog.toml"));
            let catalog = catalog::load(&path)
                .await
                .with_context(|| format!("Failed to load catalog from {}", path.display()))?;
            let summary = db
                .sync_catalog(&catalog)
                .await
                .context("Failed to sync catalog")?;
            print_json(&summary)?;
        }
        Command::IngestAll => {
            let report = ingestor(db, &config)?.ingest_all().await?;
            print_json(&report)?;
        }
        Command::IngestFeed { id } => {
            let report = ingestor(db, &config)?.ingest_feed(id).await?;
            print_json(&report)?;
        }
        Command::IngestSource { id } => {
            let report = ingestor(db, &config)?.ingest_source(id).await?;
            print_json(&report)?;
        }
        Command::ListFeeds => {
            let feeds = db.list_feeds().await.context("Failed to load feeds")?;
            print_json(&feeds)?;
        }
    }

    Ok(())
}

async fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    match Database::open(path_str).await {
        Ok(db) => Ok(db),
        Err(DatabaseError::Locked) => {
            eprintln!("Error: {}", DatabaseError::Locked);
            std::process::exit(1);
        }
        Err(e) => Err(anyhow::anyhow!("Failed to open database: {}", e)),
    }
}

fn ingestor(db: Database, config: &Config) -> Result<Ingestor<Database, HttpFetcher>> {
    let fetcher = HttpFetcher::from_config(config).context("Failed to build HTTP client")?;
    Ok(Ingestor::new(
        Arc::new(db),
        Arc::new(fetcher),
        config.max_concurrent_fetches,
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
