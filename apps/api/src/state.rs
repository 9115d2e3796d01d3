use std::sync::Arc;

use crate::config::Config;
use crate::extraction::JobSource;
use crate::llm_client::CompletionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable listing source. Default: `HttpJobSource`.
    pub job_source: Arc<dyn JobSource>,
    /// Completion boundary. Default: `LlmClient`.
    pub llm: Arc<dyn CompletionProvider>,
}
