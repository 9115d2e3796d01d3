use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::normalize_keyword;
use crate::models::job::JobListing;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub keyword: String,
    pub jobs: Vec<JobListing>,
    pub fetched_at: DateTime<Utc>,
}

/// GET /api/jobs/search?q=
pub async fn handle_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let keyword = normalize_keyword(query.q.as_deref());
    let jobs = state.job_source.search(&keyword).await?;

    Ok(Json(SearchResponse {
        keyword,
        jobs,
        fetched_at: Utc::now(),
    }))
}
