//! Job listing extraction: fetches a job-board search page and turns its markup
//! into `JobListing` records.
//!
//! The fetch strategy sits behind `JobSource` so the HTTP scraper can be swapped
//! for a browser-automation backend without touching handlers or the ranker.
//! `AppState` holds an `Arc<dyn JobSource>`.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::job::JobListing;

pub mod handlers;
pub mod http_source;
pub mod parser;

/// Keyword searched when the caller supplies none.
pub const DEFAULT_KEYWORD: &str = "research";

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The job site could not be reached or answered with a non-2xx status.
    #[error("Upstream error{}: {message}", status_suffix(.status))]
    Transport { status: Option<u16>, message: String },

    #[error("Invalid site origin: {0}")]
    InvalidOrigin(#[from] url::ParseError),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" {s}")).unwrap_or_default()
}

impl From<reqwest::Error> for ExtractError {
    fn from(e: reqwest::Error) -> Self {
        ExtractError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// A source of job listings for a search keyword.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Returns listings in document order. An empty vec is a valid answer.
    async fn search(&self, keyword: &str) -> Result<Vec<JobListing>, ExtractError>;
}

/// Normalizes a user keyword, falling back to `DEFAULT_KEYWORD` when blank.
pub fn normalize_keyword(keyword: Option<&str>) -> String {
    match keyword.map(str::trim) {
        Some(k) if !k.is_empty() => k.to_string(),
        _ => DEFAULT_KEYWORD.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keyword_defaults_to_research() {
        assert_eq!(normalize_keyword(None), "research");
        assert_eq!(normalize_keyword(Some("   ")), "research");
        assert_eq!(normalize_keyword(Some(" machine learning ")), "machine learning");
    }

    #[test]
    fn test_transport_error_message_includes_status() {
        let err = ExtractError::Transport {
            status: Some(403),
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream error 403: Forbidden");

        let err = ExtractError::Transport {
            status: None,
            message: "dns failure".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream error: dns failure");
    }
}
