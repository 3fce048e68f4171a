//! Authentication headers for provider requests.
//!
//! OpenAI-compatible endpoints (including Ollama's) take a standard
//! `Authorization: Bearer` header; Gemini takes `x-goog-api-key`.

use crate::core::provider::Provider;

/// Attach the provider-appropriate authentication header to a request.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    provider: Provider,
    api_key: &str,
) -> reqwest::RequestBuilder {
    match provider {
        Provider::Gemini => request.header("x-goog-api-key", api_key),
        Provider::OpenAi | Provider::Ollama => {
            request.header("Authorization", format!("Bearer {api_key}"))
        }
    }
}
