use serde::{Deserialize, Serialize};

use crate::core::provider::Provider;

/// System prompt used when the user has not written their own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Follow these rules in every response:\n\n1. **Be concise.** Provide the shortest answer that fully addresses the user's question—no background, no extra commentary.\n\n2. **Code-only responses.** If the user asks for code or a shell command, reply with *only* the code in a properly fenced code block. Do not include any explanation, commentary, or surrounding text.\n\n3. **No unsolicited information.** Unless the user explicitly asks for examples, alternatives, or details, do not add any additional information.\n\n4. **Clarify when needed.** If the user's request is ambiguous or missing critical details, ask a brief clarifying question—but still keep it as short as possible.";

/// Persisted settings. Every field except the provider selection is
/// optional so a hand-edited file can stay minimal; accessors fill in
/// the defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub ollama_base_url: Option<String>,
    /// Selected model; falls back to the provider's default.
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    /// Reset the session whenever the overlay is summoned.
    pub clear_on_hide: Option<bool>,
}

impl Config {
    pub fn model(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    pub fn clear_on_hide(&self) -> bool {
        self.clear_on_hide.unwrap_or(true)
    }

    /// Switch providers. The model selection is provider-specific, so
    /// it reverts to the new provider's default.
    pub fn set_provider(&mut self, provider: Provider) {
        if self.provider != provider {
            self.provider = provider;
            self.model = None;
        }
    }

    pub fn api_key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Ollama => None,
        };
        key.filter(|k| !k.trim().is_empty())
    }
}
