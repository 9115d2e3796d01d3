mod config;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod ranking;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::http_source::HttpJobSource;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobSwipe API v{}", env!("CARGO_PKG_VERSION"));

    // HTTP scraping strategy: one GET per search, parsed server-side
    let job_source = HttpJobSource::new(config.jobs_site_origin.clone(), config.scrape_timeout)?;
    info!("Job source initialized (origin: {})", config.jobs_site_origin);

    let llm = LlmClient::new(config.llm_timeout)?;
    match &config.default_ai {
        Some(ai) => info!("Default AI provider: {} ({})", ai.provider, ai.model()),
        None => info!("No default AI provider; requests must supply their own"),
    }

    let state = AppState {
        config: config.clone(),
        job_source: Arc::new(job_source),
        llm: Arc::new(llm),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the client is served from a fixed domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
