// Job ranking: deterministic keyword scoring over the full listing set, then
// background semantic refinement of the top few via the completion boundary.
// All LLM calls go through llm_client.

use thiserror::Error;

pub mod handlers;
pub mod prompts;
pub mod refine;
pub mod scoring;
pub mod tokenize;

#[derive(Debug, Error)]
pub enum RankError {
    /// Semantic refinement requested without a usable provider credential.
    #[error("AI provider not configured: {0}")]
    Configuration(String),
}
