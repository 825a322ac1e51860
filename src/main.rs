/// HTTP server entry point for the instrument search service
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tradesearch::config::load_config;
use tradesearch::search::SearchEngine;
use tradesearch::server::{app_router, AppState};
use tradesearch::store::{InstrumentRepository, InstrumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(load_config("config.toml")?);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .init();

    info!("🔍 Starting trade search service...");

    let store = Arc::new(InstrumentStore::new());
    store.load_from_file(&config.instrument_file).await?;
    info!(
        "✅ Loaded {} instruments from {}",
        store.size().await,
        config.instrument_file
    );

    let repo: Arc<dyn InstrumentRepository> = store;
    let engine = SearchEngine::new(repo, Arc::clone(&config));
    let state = Arc::new(AppState { engine });

    let router = app_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("🌐 Listening on {}", config.listen_addr);
    axum::serve(listener, router).await?;

    Ok(())
}
