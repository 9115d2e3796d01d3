//! Provider identity and per-request AI configuration.
//!
//! Configuration travels with each call as a plain value; there is no
//! process-wide provider setting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Claude,
    Groq,
    Gemini,
    Deepseek,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Claude => "claude",
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
            Provider::Deepseek => "deepseek",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o",
            Provider::Claude => "claude-3-5-sonnet-20240620",
            Provider::Groq => "llama3-70b-8192",
            Provider::Gemini => "gemini-1.5-flash",
            Provider::Deepseek => "deepseek-chat",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Claude => "https://api.anthropic.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Provider::Deepseek => "https://api.deepseek.com/v1",
        }
    }

    /// Provider a model name unambiguously belongs to, if any.
    ///
    /// Open-weight families (llama, mixtral) are served by several providers
    /// and are never used for re-routing.
    pub fn from_model_name(model: &str) -> Option<Provider> {
        let model = model.to_lowercase();
        if model.contains("deepseek") {
            Some(Provider::Deepseek)
        } else if model.contains("claude") {
            Some(Provider::Claude)
        } else if model.contains("gemini") {
            Some(Provider::Gemini)
        } else if model.starts_with("gpt-") {
            Some(Provider::OpenAi)
        } else {
            None
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "claude" | "anthropic" => Ok(Provider::Claude),
            "groq" => Ok(Provider::Groq),
            "gemini" | "google" => Ok(Provider::Gemini),
            "deepseek" => Ok(Provider::Deepseek),
            other => Err(format!("Unsupported provider: {other}")),
        }
    }
}

/// Credentials and routing for one completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    pub provider: Provider,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl AiConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Re-routes to the provider the model name points at when it disagrees
    /// with the configured provider. The base URL is reset to that provider's
    /// default, since an override for the old provider cannot serve the new one.
    pub fn self_corrected(mut self) -> Self {
        let Some(model) = self.model.clone() else {
            return self;
        };
        if let Some(indicated) = Provider::from_model_name(&model) {
            if indicated != self.provider {
                warn!(
                    "Provider mismatch: provider is {} but model is {model}. Re-routing to {indicated}",
                    self.provider
                );
                self.provider = indicated;
                self.base_url = Some(indicated.default_base_url().to_string());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: Provider, model: Option<&str>, base_url: Option<&str>) -> AiConfig {
        AiConfig {
            provider,
            api_key: "sk-test".to_string(),
            base_url: base_url.map(str::to_string),
            model: model.map(str::to_string),
        }
    }

    #[test]
    fn test_deepseek_model_on_gemini_is_rerouted() {
        let corrected = config(Provider::Gemini, Some("deepseek-chat"), None).self_corrected();
        assert_eq!(corrected.provider, Provider::Deepseek);
        assert_eq!(corrected.base_url(), "https://api.deepseek.com/v1");
        assert_eq!(corrected.model(), "deepseek-chat");
    }

    #[test]
    fn test_reroute_replaces_stale_base_url() {
        let corrected = config(
            Provider::OpenAi,
            Some("claude-3-haiku-20240307"),
            Some("https://api.openai.com/v1"),
        )
        .self_corrected();
        assert_eq!(corrected.provider, Provider::Claude);
        assert_eq!(corrected.base_url(), "https://api.anthropic.com/v1");
    }

    #[test]
    fn test_matching_provider_is_untouched() {
        let original = config(Provider::Deepseek, Some("deepseek-reasoner"), Some("https://proxy.local/v1/"));
        let corrected = original.clone().self_corrected();
        assert_eq!(corrected, original);
        assert_eq!(corrected.base_url(), "https://proxy.local/v1");
    }

    #[test]
    fn test_shared_model_families_do_not_reroute() {
        let corrected = config(Provider::Groq, Some("llama3-70b-8192"), None).self_corrected();
        assert_eq!(corrected.provider, Provider::Groq);
    }

    #[test]
    fn test_defaults_when_model_absent() {
        let cfg = config(Provider::Claude, None, None).self_corrected();
        assert_eq!(cfg.model(), "claude-3-5-sonnet-20240620");
        assert_eq!(cfg.base_url(), "https://api.anthropic.com/v1");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("deepseek".parse::<Provider>().unwrap(), Provider::Deepseek);
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn test_ai_config_deserializes_camel_case() {
        let cfg: AiConfig = serde_json::from_str(
            r#"{"provider": "groq", "apiKey": "gsk", "baseUrl": null, "model": "mixtral-8x7b"}"#,
        )
        .unwrap();
        assert_eq!(cfg.provider, Provider::Groq);
        assert!(cfg.has_api_key());
    }
}
