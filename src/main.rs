//! Newsdeck — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the source registry, cache, and
//! orchestrator into the router.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsdeck::api::{self, AppState};
use newsdeck::cache::MemoryCache;
use newsdeck::config::{self, ServiceConfig, SourceOverrides};
use newsdeck::metrics::Metrics;
use newsdeck::orchestrator::FetchOrchestrator;
use newsdeck::registry::SourceRegistry;
use newsdeck::sources;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsdeck=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServiceConfig::from_env();
    let overrides = config::load_source_overrides_default().unwrap_or_else(|error| {
        tracing::warn!(?error, "sources config unreadable, using defaults");
        SourceOverrides::default()
    });

    let client = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; newsdeck/0.1)")
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let mut registry = SourceRegistry::new();
    sources::register_builtin(&mut registry, &client);
    registry.apply_overrides(&overrides);

    let metrics = Metrics::init(config.cache_ttl_ms as u64);
    let cache = Arc::new(MemoryCache::new());
    let orchestrator = Arc::new(FetchOrchestrator::new(Arc::new(registry), cache, config));

    let app = api::router(AppState { orchestrator }).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "newsdeck listening");
    axum::serve(listener, app).await?;
    Ok(())
}
