//! Semantic refinement: fans out one LLM judgment per top-ranked job and
//! streams each result back as soon as it lands.
//!
//! Flow: config check (sync) → spawn one task per job in the top N →
//!       each task races its call against the batch `CancellationToken` →
//!       result (or fallback) sent on an mpsc channel.
//!
//! Cancelling drops in-flight futures, which aborts their HTTP requests. The
//! channel then closes without any error item; cancellation is never reported
//! through the same path as provider failures.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{complete_json, AiConfig, ChatMessage, CompletionProvider};
use crate::models::job::{JobListing, MatchResult, MatchUpdate};
use crate::models::profile::CandidateProfile;
use crate::ranking::prompts::build_match_prompt;
use crate::ranking::RankError;

pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone)]
pub struct RefineOptions {
    pub top_n: usize,
    /// Upper bound for each individual judgment call.
    pub call_timeout: Duration,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Provider output. Only the JSON shape is checked; the score is trusted.
#[derive(Debug, Deserialize)]
struct RawJudgment {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
}

impl From<RawJudgment> for MatchResult {
    fn from(raw: RawJudgment) -> Self {
        MatchResult {
            // `as` saturates: negatives and NaN land on 0.
            score: raw.score.unwrap_or(0.0).round() as u32,
            reason: raw.reason.unwrap_or_default(),
            missing_skills: raw.missing_skills,
        }
    }
}

fn ensure_configured(config: &AiConfig) -> Result<(), RankError> {
    if config.has_api_key() {
        Ok(())
    } else {
        Err(RankError::Configuration(
            "API key is required. Configure an AI provider in Settings.".to_string(),
        ))
    }
}

/// One judgment call, bounded by `call_timeout`. Errors are described, not typed:
/// every failure mode collapses into the same fallback.
async fn judge(
    provider: &dyn CompletionProvider,
    config: &AiConfig,
    job: &JobListing,
    profile: &CandidateProfile,
    call_timeout: Duration,
) -> Result<MatchResult, String> {
    let config = config.clone().self_corrected();
    let messages = [
        ChatMessage::system(JSON_ONLY_SYSTEM),
        ChatMessage::user(build_match_prompt(job, profile)),
    ];

    match tokio::time::timeout(
        call_timeout,
        complete_json::<RawJudgment>(provider, &config, &messages),
    )
    .await
    {
        Ok(Ok(raw)) => Ok(raw.into()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", call_timeout.as_secs())),
    }
}

/// Semantic match for a single job. Provider failures yield the fallback result;
/// only a missing credential is an error.
pub async fn match_job(
    provider: &dyn CompletionProvider,
    config: &AiConfig,
    job: &JobListing,
    profile: &CandidateProfile,
    call_timeout: Duration,
) -> Result<MatchResult, RankError> {
    ensure_configured(config)?;
    match judge(provider, config, job, profile, call_timeout).await {
        Ok(result) => Ok(result),
        Err(e) => {
            warn!("AI match failed for job {}: {e}", job.id);
            Ok(MatchResult::fallback())
        }
    }
}

/// Receiving end of a refinement batch.
///
/// Updates already buffered in the channel are discarded once the batch token
/// is cancelled; `recv` returns `None` from then on.
#[derive(Debug)]
pub struct MatchUpdates {
    rx: mpsc::Receiver<MatchUpdate>,
    cancel: CancellationToken,
}

impl MatchUpdates {
    pub async fn recv(&mut self) -> Option<MatchUpdate> {
        if self.cancel.is_cancelled() {
            self.rx.close();
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.rx.close();
                None
            }
            update = self.rx.recv() => update,
        }
    }
}

/// Starts refinement of the first `options.top_n` jobs of an already-ranked slice.
///
/// Returns the update stream immediately. The stream ends when every job has
/// reported or the batch is cancelled. Must be called from within a tokio runtime.
pub fn refine_top_n(
    provider: Arc<dyn CompletionProvider>,
    config: &AiConfig,
    profile: &CandidateProfile,
    jobs: &[JobListing],
    options: &RefineOptions,
    cancel: CancellationToken,
) -> Result<MatchUpdates, RankError> {
    ensure_configured(config)?;

    let batch: Vec<JobListing> = jobs.iter().take(options.top_n).cloned().collect();
    let (tx, rx) = mpsc::channel(batch.len().max(1));
    let batch_id = Uuid::new_v4();
    info!(
        "Refinement batch {batch_id}: {} of {} jobs via {}",
        batch.len(),
        jobs.len(),
        config.provider
    );

    let updates = MatchUpdates {
        rx,
        cancel: cancel.clone(),
    };

    let profile = Arc::new(profile.clone());
    for job in batch {
        let tx = tx.clone();
        let cancel = cancel.clone();
        let provider = Arc::clone(&provider);
        let profile = Arc::clone(&profile);
        let config = config.clone();
        let call_timeout = options.call_timeout;

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Batch {batch_id}: job {} cancelled in flight", job.id);
                    return;
                }
                outcome = judge(provider.as_ref(), &config, &job, &profile, call_timeout) => outcome,
            };

            let update = match outcome {
                Ok(result) => MatchUpdate {
                    job_id: job.id.clone(),
                    result,
                    fallback: false,
                },
                Err(e) => {
                    warn!("Batch {batch_id}: AI match failed for job {}: {e}", job.id);
                    MatchUpdate {
                        job_id: job.id.clone(),
                        result: MatchResult::fallback(),
                        fallback: true,
                    }
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tx.send(update) => {}
            }
        });
    }

    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm_client::{LlmError, Provider};

    /// Scripted provider keyed by job title found in the prompt.
    #[derive(Default)]
    struct ScriptedProvider {
        replies: HashMap<&'static str, Reply>,
        calls: Mutex<Vec<String>>,
        providers_seen: Mutex<Vec<Provider>>,
    }

    #[derive(Clone)]
    enum Reply {
        Json(&'static str),
        Fail,
        Hang,
    }

    impl ScriptedProvider {
        fn with(replies: &[(&'static str, Reply)]) -> Self {
            Self {
                replies: replies.iter().cloned().collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            config: &AiConfig,
            messages: &[ChatMessage],
            json_mode: bool,
        ) -> Result<String, LlmError> {
            assert!(json_mode);
            self.providers_seen.lock().unwrap().push(config.provider);
            let prompt = &messages.last().unwrap().content;
            let (title, reply) = self
                .replies
                .iter()
                .find(|(title, _)| prompt.contains(&format!("Title: {title}\n")))
                .map(|(t, r)| (t.to_string(), r.clone()))
                .unwrap_or_else(|| ("unknown".to_string(), Reply::Fail));
            self.calls.lock().unwrap().push(title);

            match reply {
                Reply::Json(body) => Ok(body.to_string()),
                Reply::Fail => Err(LlmError::Api {
                    status: 500,
                    message: "boom".to_string(),
                }),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn job(id: &str, title: &str) -> JobListing {
        serde_json::from_value(serde_json::json!({ "id": id, "title": title })).unwrap()
    }

    fn config() -> AiConfig {
        AiConfig {
            provider: Provider::OpenAi,
            api_key: "sk-test".to_string(),
            base_url: None,
            model: None,
        }
    }

    async fn collect(mut rx: MatchUpdates) -> Vec<MatchUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        updates
    }

    const GOOD: &str = r#"{"score": 81, "reason": "Good fit.", "missing_skills": ["Stan"]}"#;

    #[tokio::test]
    async fn test_only_top_n_jobs_are_judged() {
        let jobs: Vec<JobListing> = (0..10).map(|i| job(&format!("j{i}"), &format!("Job {i}"))).collect();
        let provider = Arc::new(ScriptedProvider::with(&[
            ("Job 0", Reply::Json(GOOD)),
            ("Job 1", Reply::Json(GOOD)),
            ("Job 2", Reply::Json(GOOD)),
        ]));

        let rx = refine_top_n(
            provider.clone(),
            &config(),
            &CandidateProfile::default(),
            &jobs,
            &RefineOptions::default(),
            CancellationToken::new(),
        )
        .unwrap();

        let updates = collect(rx).await;
        assert_eq!(updates.len(), 3);
        let mut calls = provider.calls();
        calls.sort();
        assert_eq!(calls, vec!["Job 0", "Job 1", "Job 2"]);
        assert!(updates.iter().all(|u| !u.fallback && u.result.score == 81));
    }

    #[tokio::test]
    async fn test_failing_call_is_isolated() {
        let jobs = vec![job("a", "Alpha"), job("b", "Beta"), job("c", "Gamma")];
        let provider = Arc::new(ScriptedProvider::with(&[
            ("Alpha", Reply::Json(GOOD)),
            ("Beta", Reply::Fail),
            ("Gamma", Reply::Json("not json at all")),
        ]));

        let rx = refine_top_n(
            provider,
            &config(),
            &CandidateProfile::default(),
            &jobs,
            &RefineOptions::default(),
            CancellationToken::new(),
        )
        .unwrap();

        let updates: HashMap<String, MatchUpdate> = collect(rx)
            .await
            .into_iter()
            .map(|u| (u.job_id.clone(), u))
            .collect();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates["a"].result.score, 81);
        assert!(!updates["a"].fallback);
        assert_eq!(updates["b"].result, MatchResult::fallback());
        assert!(updates["b"].fallback);
        assert_eq!(updates["c"].result, MatchResult::fallback());
    }

    #[tokio::test]
    async fn test_missing_score_defaults_to_zero() {
        let jobs = vec![job("a", "Alpha")];
        let provider = Arc::new(ScriptedProvider::with(&[(
            "Alpha",
            Reply::Json(r#"{"reason": "No score given."}"#),
        )]));

        let rx = refine_top_n(
            provider,
            &config(),
            &CandidateProfile::default(),
            &jobs,
            &RefineOptions::default(),
            CancellationToken::new(),
        )
        .unwrap();

        let updates = collect(rx).await;
        assert_eq!(updates[0].result.score, 0);
        assert_eq!(updates[0].result.reason, "No score given.");
        assert!(updates[0].result.missing_skills.is_empty());
        assert!(!updates[0].fallback);
    }

    #[tokio::test]
    async fn test_cancel_after_first_delivery_stops_stream() {
        let jobs = vec![job("a", "Alpha"), job("b", "Beta"), job("c", "Gamma")];
        let provider = Arc::new(ScriptedProvider::with(&[
            ("Alpha", Reply::Json(GOOD)),
            ("Beta", Reply::Hang),
            ("Gamma", Reply::Hang),
        ]));
        let cancel = CancellationToken::new();

        let mut rx = refine_top_n(
            provider,
            &config(),
            &CandidateProfile::default(),
            &jobs,
            &RefineOptions::default(),
            cancel.clone(),
        )
        .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.job_id, "a");

        cancel.cancel();
        let rest = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("stream should close promptly after cancel");
        assert!(rest.is_none(), "no deliveries after cancellation");
    }

    #[tokio::test]
    async fn test_buffered_updates_are_dropped_after_cancel() {
        let jobs = vec![job("a", "Alpha"), job("b", "Beta"), job("c", "Gamma")];
        let provider = Arc::new(ScriptedProvider::with(&[
            ("Alpha", Reply::Json(GOOD)),
            ("Beta", Reply::Json(GOOD)),
            ("Gamma", Reply::Json(GOOD)),
        ]));
        let cancel = CancellationToken::new();

        let mut rx = refine_top_n(
            provider.clone(),
            &config(),
            &CandidateProfile::default(),
            &jobs,
            &RefineOptions::default(),
            cancel.clone(),
        )
        .unwrap();

        assert!(rx.recv().await.is_some());
        // Let the remaining tasks finish and fill the channel.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.calls().len(), 3);

        cancel.cancel();
        assert!(rx.recv().await.is_none());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_yields_fallback() {
        let jobs = vec![job("a", "Alpha")];
        let provider = Arc::new(ScriptedProvider::with(&[("Alpha", Reply::Hang)]));
        let options = RefineOptions {
            top_n: 3,
            call_timeout: Duration::from_millis(50),
        };

        let rx = refine_top_n(
            provider,
            &config(),
            &CandidateProfile::default(),
            &jobs,
            &options,
            CancellationToken::new(),
        )
        .unwrap();

        let updates = collect(rx).await;
        assert_eq!(updates.len(), 1);
        assert!(updates[0].fallback);
        assert_eq!(updates[0].result.reason, "Failed to calculate match.");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_any_call() {
        let provider = Arc::new(ScriptedProvider::default());
        let mut cfg = config();
        cfg.api_key = String::new();

        let result = refine_top_n(
            provider.clone(),
            &cfg,
            &CandidateProfile::default(),
            &[job("a", "Alpha")],
            &RefineOptions::default(),
            CancellationToken::new(),
        );

        assert!(matches!(result, Err(RankError::Configuration(_))));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_is_self_corrected_before_each_call() {
        let jobs = vec![job("a", "Alpha"), job("b", "Beta")];
        let provider = Arc::new(ScriptedProvider::with(&[
            ("Alpha", Reply::Json(GOOD)),
            ("Beta", Reply::Json(GOOD)),
        ]));
        let mut cfg = config();
        cfg.provider = Provider::Gemini;
        cfg.model = Some("deepseek-chat".to_string());

        let rx = refine_top_n(
            provider.clone(),
            &cfg,
            &CandidateProfile::default(),
            &jobs,
            &RefineOptions::default(),
            CancellationToken::new(),
        )
        .unwrap();
        collect(rx).await;

        let seen = provider.providers_seen.lock().unwrap().clone();
        assert_eq!(seen, vec![Provider::Deepseek, Provider::Deepseek]);
    }

    #[tokio::test]
    async fn test_match_job_falls_back_on_failure() {
        let provider = ScriptedProvider::with(&[("Alpha", Reply::Fail)]);
        let result = match_job(
            &provider,
            &config(),
            &job("a", "Alpha"),
            &CandidateProfile::default(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(result, MatchResult::fallback());
    }
}
