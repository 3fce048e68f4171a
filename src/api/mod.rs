//! Wire payloads for the provider streaming protocols.
//!
//! Two shapes exist: the OpenAI-compatible chat-completion protocol
//! (also spoken by Ollama) and Gemini's `streamGenerateContent`
//! protocol. Both stream server-sent events; only the payloads differ.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatResponseChoice {
    pub delta: ChatResponseDelta,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

/// Gemini mixes casings on the wire: `system_instruction` is
/// snake_case while `generationConfig` and its children are camelCase.
#[derive(Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiInstruction>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
pub struct GeminiInstruction {
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Serialize)]
pub struct GeminiGenerationConfig {
    #[serde(rename = "thinkingConfig")]
    pub thinking_config: GeminiThinkingConfig,
}

#[derive(Serialize)]
pub struct GeminiThinkingConfig {
    #[serde(rename = "thinkingBudget")]
    pub thinking_budget: u32,
}

#[derive(Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<GeminiCandidate>>,
    pub error: Option<GeminiError>,
}

#[derive(Deserialize)]
pub struct GeminiError {
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
pub struct GeminiCandidateContent {
    pub parts: Option<Vec<GeminiCandidatePart>>,
}

#[derive(Deserialize)]
pub struct GeminiCandidatePart {
    pub text: Option<String>,
}
