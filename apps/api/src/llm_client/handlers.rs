use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, ProxyError};
use crate::llm_client::{AiConfig, ChatMessage, Provider};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub json_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub success: bool,
    pub text: String,
}

impl CompletionRequest {
    fn into_parts(self) -> Result<(AiConfig, Vec<ChatMessage>, bool), AppError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Validation("API Key is required".to_string()))?;
        let provider: Provider = self.provider.parse().map_err(AppError::Validation)?;

        let config = AiConfig {
            provider,
            api_key,
            base_url: self.base_url,
            model: self.model,
        };
        Ok((config, self.messages, self.json_mode))
    }
}

/// POST /api/ai/completion
pub async fn handle_completion(
    State(state): State<AppState>,
    Json(req): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, ProxyError> {
    let (config, messages, json_mode) = req.into_parts()?;
    info!(
        "AI proxy request: provider={}, model={}, base_url={}",
        config.provider,
        config.model(),
        if config.base_url.is_some() { "SET" } else { "NONE" }
    );

    let text = state.llm.complete(&config, &messages, json_mode).await?;
    Ok(Json(CompletionResponse {
        success: true,
        text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(provider: &str, api_key: Option<&str>) -> CompletionRequest {
        CompletionRequest {
            provider: provider.to_string(),
            api_key: api_key.map(str::to_string),
            base_url: None,
            model: Some("gpt-4o-mini".to_string()),
            messages: vec![ChatMessage::user("hi")],
            json_mode: true,
        }
    }

    #[test]
    fn test_missing_api_key_is_validation_error() {
        let err = request("openai", None).into_parts().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "API Key is required"));

        let err = request("openai", Some("")).into_parts().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unsupported_provider_is_validation_error() {
        let err = request("cohere", Some("k")).into_parts().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Unsupported provider")));
    }

    #[test]
    fn test_valid_request_builds_config() {
        let (config, messages, json_mode) = request("groq", Some("gsk")).into_parts().unwrap();
        assert_eq!(config.provider, Provider::Groq);
        assert_eq!(config.api_key, "gsk");
        assert_eq!(messages.len(), 1);
        assert!(json_mode);
    }
}
