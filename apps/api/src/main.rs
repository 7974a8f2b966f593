mod config;
mod curriculum;
mod db;
mod errors;
mod llm_client;
mod models;
mod resources;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::curriculum::store::{DisabledStore, PgRoadmapStore, RoadmapStore};
use crate::db::create_pool;
use crate::llm_client::{LlmClient, TextGenerator};
use crate::resources::enrichment::EnrichmentEngine;
use crate::resources::provider::select_provider;
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

    info!("Starting Waypoint API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence is optional; without it runs are served but not saved
    let store: Arc<dyn RoadmapStore> = match &config.database_url {
        Some(url) => Arc::new(PgRoadmapStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; roadmap persistence disabled");
            Arc::new(DisabledStore)
        }
    };

    let llm: Option<Arc<dyn TextGenerator>> = match &config.gemini_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmClient::new(key.clone())))
        }
        None => {
            warn!("GEMINI_API_KEY not set; roadmap generation will answer 503");
            None
        }
    };

    let provider = select_provider(&config.provider_settings());
    let enrichment = EnrichmentEngine::new(provider, config.quota_policy());
    match enrichment.provider_name() {
        Some(name) => info!("Video provider: {name}"),
        None => warn!("No video provider key set; curated resources are used as-is"),
    }

    let state = AppState {
        llm,
        enrichment,
        store,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config.cors_origins)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive when no origins are configured, otherwise an explicit allow-list.
fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let allowed = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    info!("CORS restricted to {} origins", allowed.len());

    Ok(CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any))
}
