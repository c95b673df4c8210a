mod analytics;
mod config;
mod db;
mod errors;
mod models;
mod provider;
mod repositories;
mod routes;
mod state;
mod store;
mod sync;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::provider::GitHubClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::Store;
use crate::sync::{BackgroundDispatcher, InlineDispatcher, SyncDispatcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting DevScope API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite
    let store = Store::new(create_pool(&config.database_url).await?);

    // Initialize GitHub client
    let provider = GitHubClient::new(config.github_api_url.clone(), config.sync.max_pages)
        .context("Failed to build the GitHub HTTP client")?;
    info!("GitHub client initialized ({})", config.github_api_url);

    let dispatcher: Arc<dyn SyncDispatcher> = if config.sync.inline {
        Arc::new(InlineDispatcher)
    } else {
        Arc::new(BackgroundDispatcher)
    };
    info!(
        "Sync dispatch: {}, {} detail fetches in flight",
        if config.sync.inline { "inline" } else { "background" },
        config.sync.detail_concurrency
    );

    // Build app state
    let state = AppState {
        store,
        provider: Arc::new(provider),
        dispatcher,
        config: config.clone(),
    };

    // Build router
    // TODO: restrict CORS origins once the dashboard has a fixed host
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
