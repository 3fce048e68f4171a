//! Provider selection and the per-request configuration snapshot.
//!
//! The session controller takes a [`RequestConfig`] snapshot at
//! submission time; settings edited while a stream is in flight never
//! affect that stream.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Ollama's OpenAI-compatible endpoint wants a bearer token but does
/// not check it.
pub const OLLAMA_PLACEHOLDER_API_KEY: &str = "ollama";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Gemini,
    Ollama,
}

impl Provider {
    pub fn id(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Ollama => "ollama",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Google Gemini",
            Provider::Ollama => "Ollama",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4.1-mini",
            Provider::Gemini => "gemini-2.5-flash",
            Provider::Ollama => "qwen3",
        }
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, Provider::Ollama)
    }

    pub fn from_id(id: &str) -> Option<Provider> {
        match id.to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "gemini" => Some(Provider::Gemini),
            "ollama" => Some(Provider::Ollama),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Configuration problems detected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey { provider: Provider },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey { provider } => write!(
                f,
                "{} API key not configured. Press Ctrl+, to set it up.",
                provider.display_name()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Immutable snapshot of everything one submission needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

impl RequestConfig {
    /// Capture the current settings, validating the credential first.
    pub fn snapshot(config: &Config) -> Result<RequestConfig, ConfigError> {
        let provider = config.provider;

        let api_key = if provider.requires_api_key() {
            config
                .api_key_for(provider)
                .ok_or(ConfigError::MissingApiKey { provider })?
                .to_string()
        } else {
            OLLAMA_PLACEHOLDER_API_KEY.to_string()
        };

        let base_url = match provider {
            Provider::OpenAi => DEFAULT_OPENAI_BASE_URL.to_string(),
            Provider::Gemini => DEFAULT_GEMINI_BASE_URL.to_string(),
            Provider::Ollama => config
                .ollama_base_url
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
        };

        Ok(RequestConfig {
            provider,
            api_key,
            base_url,
            model: config.model(),
            system_prompt: config.system_prompt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_fails_fast_without_openai_key() {
        let config = Config::default();
        let err = RequestConfig::snapshot(&config).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingApiKey {
                provider: Provider::OpenAi
            }
        );
        assert!(err.to_string().contains("OpenAI API key not configured"));
    }

    #[test]
    fn snapshot_fails_fast_without_gemini_key() {
        let config = Config {
            provider: Provider::Gemini,
            ..Config::default()
        };
        assert!(RequestConfig::snapshot(&config).is_err());
    }

    #[test]
    fn ollama_substitutes_placeholder_credential() {
        let config = Config {
            provider: Provider::Ollama,
            ..Config::default()
        };
        let snapshot = RequestConfig::snapshot(&config).unwrap();
        assert_eq!(snapshot.api_key, OLLAMA_PLACEHOLDER_API_KEY);
        assert_eq!(snapshot.base_url, DEFAULT_OLLAMA_BASE_URL);
        assert_eq!(snapshot.model, "qwen3");
    }

    #[test]
    fn ollama_honors_configured_base_url() {
        let config = Config {
            provider: Provider::Ollama,
            ollama_base_url: Some("http://192.168.1.20:11434/v1/".to_string()),
            ..Config::default()
        };
        let snapshot = RequestConfig::snapshot(&config).unwrap();
        assert_eq!(snapshot.base_url, "http://192.168.1.20:11434/v1/");
    }

    #[test]
    fn snapshot_captures_model_and_prompt() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            model: Some("gpt-4o".to_string()),
            system_prompt: Some("Answer tersely.".to_string()),
            ..Config::default()
        };
        let snapshot = RequestConfig::snapshot(&config).unwrap();
        assert_eq!(snapshot.provider, Provider::OpenAi);
        assert_eq!(snapshot.api_key, "sk-test");
        assert_eq!(snapshot.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(snapshot.model, "gpt-4o");
        assert_eq!(snapshot.system_prompt, "Answer tersely.");
    }

    #[test]
    fn provider_ids_round_trip() {
        for provider in [Provider::OpenAi, Provider::Gemini, Provider::Ollama] {
            assert_eq!(Provider::from_id(provider.id()), Some(provider));
        }
        assert_eq!(Provider::from_id("anthropic"), None);
    }
}
