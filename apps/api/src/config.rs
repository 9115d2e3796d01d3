use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::llm_client::{AiConfig, Provider};
use crate::ranking::refine::{RefineOptions, DEFAULT_TOP_N};

const DEFAULT_SITE_ORIGIN: &str = "https://www.jobs.ac.uk";

/// Application configuration loaded from environment variables.
/// Nothing is required; every value has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub jobs_site_origin: Url,
    pub scrape_timeout: Duration,
    pub llm_timeout: Duration,
    pub refine_top_n: usize,
    /// Server-side AI provider used when a request carries none.
    pub default_ai: Option<AiConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            jobs_site_origin: Url::parse(DEFAULT_SITE_ORIGIN).expect("default origin is a valid URL"),
            scrape_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(30),
            refine_top_n: DEFAULT_TOP_N,
            default_ai: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            jobs_site_origin: match optional_env("JOBS_SITE_ORIGIN") {
                Some(origin) => Url::parse(&origin)
                    .with_context(|| format!("JOBS_SITE_ORIGIN '{origin}' is not a valid URL"))?,
                None => defaults.jobs_site_origin,
            },
            scrape_timeout: Duration::from_secs(parse_env(
                "SCRAPE_TIMEOUT_SECS",
                defaults.scrape_timeout.as_secs(),
            )?),
            llm_timeout: Duration::from_secs(parse_env(
                "LLM_TIMEOUT_SECS",
                defaults.llm_timeout.as_secs(),
            )?),
            refine_top_n: parse_env("REFINE_TOP_N", defaults.refine_top_n)?,
            default_ai: default_ai_from_env()?,
        })
    }

    pub fn refine_options(&self, top_n: Option<usize>) -> RefineOptions {
        RefineOptions {
            top_n: top_n.unwrap_or(self.refine_top_n),
            call_timeout: self.llm_timeout,
        }
    }
}

fn default_ai_from_env() -> Result<Option<AiConfig>> {
    let Some(provider) = optional_env("AI_PROVIDER") else {
        return Ok(None);
    };
    let provider: Provider = provider
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("AI_PROVIDER is invalid")?;

    Ok(Some(AiConfig {
        provider,
        api_key: optional_env("AI_API_KEY").unwrap_or_default(),
        base_url: optional_env("AI_BASE_URL"),
        model: optional_env("AI_MODEL"),
    }))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jobs_site_origin.as_str(), "https://www.jobs.ac.uk/");
        assert_eq!(config.refine_top_n, 3);
        assert!(config.default_ai.is_none());
    }

    #[test]
    fn test_refine_options_override() {
        let config = Config::default();
        assert_eq!(config.refine_options(None).top_n, 3);
        assert_eq!(config.refine_options(Some(5)).top_n, 5);
        assert_eq!(config.refine_options(None).call_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_env_missing_uses_default() {
        let value: u16 = parse_env("JOBSWIPE_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
