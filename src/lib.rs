pub mod client;
pub mod core;
pub mod persist;
pub mod providers;
pub mod server;
pub mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::persist::Persistor;
use crate::providers::AwesomeApiProvider;
use crate::server::AppState;
use crate::store::FjallRateStore;

/// Builds the shared state from configuration: opens the rate store
/// (provisioning its schema) and prepares the upstream client.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let store = FjallRateStore::open(&config.storage.data_path).with_context(|| {
        format!(
            "Failed to open rate store at {}",
            config.storage.data_path.display()
        )
    })?;
    let provider = AwesomeApiProvider::new(&config.upstream.url, config.upstream.timeout())?;
    let persistor = Persistor::new(Arc::new(store), &config.persistence);
    Ok(AppState::new(Arc::new(provider), persistor))
}

pub async fn run_server(config_path: Option<&str>) -> Result<()> {
    info!("Quote service starting...");

    let config = AppConfig::resolve(config_path)?;
    debug!("Loaded config: {config:#?}");

    let state = build_state(&config)?;
    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;

    server::serve(listener, state).await
}
