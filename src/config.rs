use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub favorites: FavoritesConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_cors")]
    pub cors: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
    /// Property holding the numeric primary key of each feature.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Upper bound on a caller's k. Unset means a large k returns the whole
    /// dataset.
    #[serde(default)]
    pub max_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FavoritesConfig {
    /// "memory" or "sqlite"
    #[serde(default = "default_favorites_backend")]
    pub backend: String,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
    /// Reject adds of ids the dataset does not contain.
    #[serde(default)]
    pub validate_ids: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token -> identity.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

// Never echo credentials back through the config endpoint or logs.
impl Serialize for AuthConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("AuthConfig", 1)?;
        s.serialize_field("token_count", &self.tokens.len())?;
        s.end()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatsConfig {
    #[serde(default = "default_stats_enable")]
    pub enable: bool,
    #[serde(default = "default_log_interval")]
    pub log_interval_seconds: u64,
}

// Defaults
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_cors() -> bool {
    true
}
fn default_dataset_path() -> String {
    "chargers.json".to_string()
}
fn default_primary_key() -> String {
    "OBJECTID".to_string()
}
fn default_limit() -> usize {
    20
}
fn default_favorites_backend() -> String {
    "memory".to_string()
}
fn default_sqlite_path() -> String {
    "favorites.db".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_stats_enable() -> bool {
    true
}
fn default_log_interval() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            server: ServerConfig::default(),
            dataset: DatasetConfig::default(),
            query: QueryConfig::default(),
            favorites: FavoritesConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cors: default_cors(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            primary_key: default_primary_key(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: None,
        }
    }
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            backend: default_favorites_backend(),
            sqlite_path: default_sqlite_path(),
            validate_ids: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enable: default_stats_enable(),
            log_interval_seconds: default_log_interval(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config TOML")?;
        Ok(config)
    }
}
