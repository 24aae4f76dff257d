//! Application configuration.
//!
//! Values are resolved from, highest priority first:
//! 1. environment variables prefixed with `LOREKEEPER_`
//!    (e.g. `LOREKEEPER_VICTORY_THRESHOLD=25`);
//! 2. `config.toml` in the user config directory (`~/.config/lorekeeper/`);
//! 3. built-in defaults.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{game::DEFAULT_VICTORY_THRESHOLD, repository::RepositoryCache};

/// Directory name used under the platform config and cache directories.
pub const APP_DIR: &str = "lorekeeper";
/// Well-known location of the published card dump.
pub const DEFAULT_REPOSITORY_URL: &str = "https://lorcanajson.org/files/current/fr/allCards.json";
/// Relay used to reach the card dump.
pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw";

const DEFAULT_CONFIG: &str = r#"# lorekeeper configuration

# Directory holding the cached card repository.
# cache_root = "/path/to/cache"

# Published card dump used by remote refresh.
repository_url = "https://lorcanajson.org/files/current/fr/allCards.json"

# CORS relay the request is routed through. Set to "" to fetch directly.
relay_url = "https://api.allorigins.win/raw"

request_timeout_secs = 30

# Score needed to win a new match.
victory_threshold = 20
"#;

/// Resolved configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory of the durable repository slot.
    pub cache_root: PathBuf,
    /// Remote card dump location.
    pub repository_url: String,
    /// Optional relay wrapping the remote request.
    pub relay_url: Option<String>,
    /// Remote request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Initial victory threshold for new matches.
    pub victory_threshold: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            relay_url: Some(DEFAULT_RELAY_URL.to_string()),
            request_timeout_secs: 30,
            victory_threshold: DEFAULT_VICTORY_THRESHOLD,
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from an explicit config file (optional) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("LOREKEEPER")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// Durable slot for the card repository.
    pub fn repository_cache(&self) -> RepositoryCache {
        RepositoryCache::in_dir(&self.cache_root)
    }
}

/// Location of the user config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Write the commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: PathBuf) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
