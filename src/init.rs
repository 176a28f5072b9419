//! Initialization helpers for the application startup.

use crate::access::{AccessMediator, Authenticator, StaticTokenAuthenticator};
use crate::api::ApiState;
use crate::config::Config;
use crate::db::DbClient;
use crate::engine::{load_file, ChargerIndex};
use crate::favorites::{FavoritesStore, MemoryFavoritesStore, SqliteFavoritesStore};
use crate::query::QueryService;
use crate::stats::StatsCollector;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Loads the charger dataset. Any failure here is fatal.
pub fn init_index(config: &Config) -> Result<Arc<ChargerIndex>> {
    let (index, _report) = load_file(&config.dataset.path, &config.dataset.primary_key)
        .with_context(|| format!("Failed to load charger dataset {}", config.dataset.path))?;
    Ok(Arc::new(index))
}

/// Picks the favorites backend from `[favorites] backend`.
pub fn init_favorites_store(config: &Config) -> Result<Arc<dyn FavoritesStore>> {
    match config.favorites.backend.as_str() {
        "sqlite" => {
            info!("Using SQLite favorites store.");
            let client = DbClient::new(config.favorites.sqlite_path.clone())
                .context("Failed to open favorites database")?;
            client
                .initialize()
                .context("Failed to initialize favorites database")?;
            Ok(Arc::new(SqliteFavoritesStore::new(Arc::new(client))))
        }
        "memory" => {
            info!("Using in-memory favorites store; favorites are lost on restart.");
            Ok(Arc::new(MemoryFavoritesStore::new()))
        }
        other => {
            warn!(
                "Unknown favorites backend '{}', defaulting to in-memory store",
                other
            );
            Ok(Arc::new(MemoryFavoritesStore::new()))
        }
    }
}

pub fn init_authenticator(config: &Config) -> Arc<dyn Authenticator> {
    let authenticator = StaticTokenAuthenticator::new(&config.auth.tokens);
    if authenticator.is_empty() {
        warn!("No auth tokens configured; favorites are unreachable.");
    } else {
        info!("Loaded {} auth tokens.", authenticator.len());
    }
    Arc::new(authenticator)
}

/// Wires the services the HTTP layer needs around an already-built index.
pub fn build_api_state(
    config: Config,
    index: Arc<ChargerIndex>,
    favorites: Arc<dyn FavoritesStore>,
    authenticator: Arc<dyn Authenticator>,
    stats: Arc<StatsCollector>,
) -> Arc<ApiState> {
    let query = QueryService::new(
        index,
        config.query.default_limit,
        config.query.max_limit,
    );
    let access = AccessMediator::new(
        favorites,
        query.clone(),
        config.favorites.validate_ids,
        stats.clone(),
    );

    Arc::new(ApiState {
        query,
        access,
        authenticator,
        stats,
        config,
    })
}
