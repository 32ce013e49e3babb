//! Configuration file parser for ~/.config/newsdesk/config.toml.
//!
//! The config file is optional. A missing file yields `Config::default()`,
//! and unknown keys are accepted but logged as likely typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0} bytes (max 1 MB)")]
    TooLarge(u64),
}

/// Top-level configuration.
///
/// Any subset of keys may be given; the rest fall back to `Default`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Catalog TOML used by `sync-catalog` when no file argument is given.
    pub catalog_path: Option<PathBuf>,

    /// Deadline for one feed download, connect through last body byte.
    pub fetch_timeout_secs: u64,

    /// Feeds fetched in parallel during `ingest-all` and `ingest-source`.
    pub max_concurrent_fetches: usize,

    /// Largest feed document accepted, in bytes.
    pub max_feed_bytes: usize,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            catalog_path: None,
            fetch_timeout_secs: 30,
            max_concurrent_fetches: 10,
            max_feed_bytes: 10 * 1024 * 1024,
            user_agent: format!("newsdesk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "database_path",
        "catalog_path",
        "fetch_timeout_secs",
        "max_concurrent_fetches",
        "max_feed_bytes",
        "user_agent",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(meta.len()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            timeout_secs = config.fetch_timeout_secs,
            concurrency = config.max_concurrent_fetches,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(content)?;
        if config.max_concurrent_fetches == 0 {
            tracing::warn!("max_concurrent_fetches = 0 would stall ingestion, using 1");
            config.max_concurrent_fetches = 1;
        }
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
