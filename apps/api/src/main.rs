mod config;
mod errors;
mod llm_client;
mod retention;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::retention::cache::{BundleCache, MokaBundleCache, NoopCache};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Retention API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.ollama_url.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )
    .context("Failed to build HTTP client for the model backend")?;
    info!(
        "LLM client initialized (model: {}, backend: {})",
        llm_client::MODEL,
        llm.base_url()
    );

    // Initialize bundle cache (MokaBundleCache by default — disable via CACHE_MAX_CAPACITY=0)
    let cache: Arc<dyn BundleCache> = if config.cache_max_capacity == 0 {
        info!("Bundle cache disabled");
        Arc::new(NoopCache)
    } else {
        info!(
            "Bundle cache initialized (ttl: {}s, capacity: {})",
            config.cache_ttl_secs, config.cache_max_capacity
        );
        Arc::new(MokaBundleCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_capacity,
        ))
    };

    let state = AppState {
        llm: Arc::new(llm),
        cache,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
