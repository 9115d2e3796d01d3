pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::llm_client::handlers as ai;
use crate::ranking::handlers as ranking;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Job ingestion
        .route("/api/jobs/search", get(extraction::handle_search))
        // Ranking
        .route("/api/jobs/rank", post(ranking::handle_rank))
        .route("/api/jobs/match", post(ranking::handle_match))
        .route("/api/jobs/discover", post(ranking::handle_discover))
        // AI proxy
        .route("/api/ai/completion", post(ai::handle_completion))
        .with_state(state)
}
