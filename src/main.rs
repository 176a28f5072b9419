use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use tracing::info;

use charger_finder::api::start_api_server;
use charger_finder::config::Config;
use charger_finder::init::{
    build_api_state, init_authenticator, init_favorites_store, init_index, setup_logging,
};
use charger_finder::stats::StatsCollector;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config_exists = std::path::Path::new(&config_path).exists();
    let config = if config_exists {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting charger-finder...");

    if !config_exists {
        info!("Config file not found, using defaults.");
    }

    // 3. Load Dataset & Build Index
    let index = init_index(&config)?;

    // 4. Init Stats
    let stats = StatsCollector::new();
    if config.stats.enable {
        stats.spawn_reporter(config.stats.log_interval_seconds);
    }

    // 5. Init Favorites Store & Authentication
    let favorites = init_favorites_store(&config)?;
    let authenticator = init_authenticator(&config);

    // 6. Start API Server
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid host address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);

    let state = build_api_state(config, index, favorites, authenticator, stats);
    start_api_server(state, addr).await?;

    info!("Shutdown complete.");
    Ok(())
}
