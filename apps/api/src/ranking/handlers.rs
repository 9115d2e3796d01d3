use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::normalize_keyword;
use crate::llm_client::AiConfig;
use crate::models::job::{JobListing, MatchResult, MatchUpdate};
use crate::models::profile::CandidateProfile;
use crate::ranking::refine::{match_job, refine_top_n, MatchUpdates};
use crate::ranking::scoring::{apply_update, rank_jobs};
use crate::ranking::RankError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub profile: CandidateProfile,
    pub jobs: Vec<JobListing>,
    /// Semantic results the client already holds; re-applied after scoring.
    #[serde(default)]
    pub updates: Vec<MatchUpdate>,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub jobs: Vec<JobListing>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job: JobListing,
    #[serde(default)]
    pub profile: CandidateProfile,
    #[serde(default)]
    pub ai: Option<AiConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub profile: CandidateProfile,
    #[serde(default)]
    pub ai: Option<AiConfig>,
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
struct RankedEvent<'a> {
    keyword: &'a str,
    jobs: &'a [JobListing],
}

/// Request config first, then the server default. A request config without a
/// key does not shadow the server default.
fn resolve_ai(state: &AppState, requested: Option<AiConfig>) -> Result<AiConfig, RankError> {
    let resolved = match requested {
        Some(ai) if ai.has_api_key() => Some(ai),
        requested => state.config.default_ai.clone().or(requested),
    };
    resolved.ok_or_else(|| RankError::Configuration("No AI provider configured.".to_string()))
}

/// POST /api/jobs/rank
pub async fn handle_rank(Json(req): Json<RankRequest>) -> Json<RankResponse> {
    let mut jobs = rank_jobs(&req.profile, req.jobs);
    for update in &req.updates {
        apply_update(&mut jobs, update);
    }
    Json(RankResponse { jobs })
}

/// POST /api/jobs/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let ai = resolve_ai(&state, req.ai)?;
    let result = match_job(
        state.llm.as_ref(),
        &ai,
        &req.job,
        &req.profile,
        state.config.llm_timeout,
    )
    .await?;
    Ok(Json(result))
}

/// POST /api/jobs/discover
///
/// Scrapes, ranks deterministically, and answers with an SSE stream:
/// `ranked` first, then one `match` per refined job as it lands, then `done`.
/// Dropping the response (client disconnect) cancels the refinement batch.
pub async fn handle_discover(
    State(state): State<AppState>,
    Json(req): Json<DiscoverRequest>,
) -> Result<Sse<BoxStream<'static, Result<Event, Infallible>>>, AppError> {
    let keyword = normalize_keyword(req.keyword.as_deref());
    let jobs = state.job_source.search(&keyword).await?;
    let ranked = rank_jobs(&req.profile, jobs);
    info!("Discover '{keyword}': {} jobs ranked", ranked.len());

    let ranked_event = json_event(
        "ranked",
        &RankedEvent {
            keyword: &keyword,
            jobs: &ranked,
        },
    );
    let head = stream::once(async move { ranked_event });
    let done = stream::once(async { Event::default().event("done").data("{}") });

    let refinement = resolve_ai(&state, req.ai).and_then(|ai| {
        let cancel = CancellationToken::new();
        let rx = refine_top_n(
            state.llm.clone(),
            &ai,
            &req.profile,
            &ranked,
            &state.config.refine_options(req.top_n),
            cancel.clone(),
        )?;
        Ok((rx, cancel.drop_guard()))
    });

    let body = match refinement {
        Ok((rx, guard)) => head.chain(update_stream(rx, guard)).chain(done).boxed(),
        Err(e) => {
            warn!("Semantic refinement unavailable: {e}");
            let unavailable = json_event(
                "refine_unavailable",
                &serde_json::json!({ "message": e.to_string() }),
            );
            head.chain(stream::once(async move { unavailable }))
                .chain(done)
                .boxed()
        }
    };

    Ok(Sse::new(body.map(Ok).boxed()).keep_alive(KeepAlive::default()))
}

/// Turns the refinement channel into `match` events. The guard lives as long
/// as the stream, so dropping the stream cancels the batch.
fn update_stream(
    rx: MatchUpdates,
    guard: DropGuard,
) -> impl futures::Stream<Item = Event> + Send + 'static {
    stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let update = rx.recv().await?;
        Some((json_event("match", &update), (rx, guard)))
    })
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    match Event::default().event(name).json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("Failed to serialize '{name}' event: {e}");
            Event::default().event("error").data("serialization failed")
        }
    }
}
