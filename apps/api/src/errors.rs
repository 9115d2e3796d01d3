use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::llm_client::LlmError;
use crate::ranking::RankError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The job site could not be reached or refused the request.
    #[error("Upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Transport { status, message } => AppError::Upstream { status, message },
            ExtractError::InvalidOrigin(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<RankError> for AppError {
    fn from(e: RankError) -> Self {
        match e {
            RankError::Configuration(msg) => AppError::Configuration(msg),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => AppError::Configuration(e.to_string()),
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Upstream { status, message } => {
                tracing::error!("Scraping error: {message}");
                let status = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    status,
                    "UPSTREAM_ERROR",
                    format!("Failed to fetch jobs: {message}"),
                )
            }
            AppError::Configuration(msg) => (
                StatusCode::BAD_REQUEST,
                "CONFIGURATION_ERROR",
                msg.clone(),
            ),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    format!("AI provider error: {msg}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Error shape of the AI completion proxy: `{"error": "<message>"}`.
/// Provider failures answer 500 on that route.
#[derive(Debug)]
pub struct ProxyError(pub AppError);

impl From<AppError> for ProxyError {
    fn from(e: AppError) -> Self {
        ProxyError(e)
    }
}

impl From<LlmError> for ProxyError {
    fn from(e: LlmError) -> Self {
        ProxyError(e.into())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, _, message) = self.0.parts();
        let status = match self.0 {
            AppError::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => status,
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
