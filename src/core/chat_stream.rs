//! Streaming provider adapter.
//!
//! One entry point opens the provider-appropriate HTTP stream and
//! forwards text fragments, in network order, over an unbounded
//! channel. Every message is tagged with the stream id of the
//! submission that spawned it so the session controller can discard
//! fragments from a cancelled stream. No buffering, no reordering, no
//! retries; the task ends when the provider closes the stream, an
//! error surfaces, or the cancellation token fires.

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{
    ChatMessage, ChatRequest, ChatResponse, GeminiContent, GeminiGenerationConfig,
    GeminiInstruction, GeminiPart, GeminiThinkingConfig, GenerateContentRequest,
    GenerateContentResponse,
};
use crate::core::provider::{Provider, RequestConfig};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub config: RequestConfig,
    pub prompt: String,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

type StreamSender = mpsc::UnboundedSender<(StreamMessage, u64)>;

#[derive(Clone)]
pub struct ChatStreamService {
    tx: StreamSender,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let cancel_token = params.cancel_token.clone();
            let stream_id = params.stream_id;
            tokio::select! {
                _ = run_stream(params, tx) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream cancelled");
                }
            }
        });
    }
}

async fn run_stream(params: StreamParams, tx: StreamSender) {
    let StreamParams {
        client,
        config,
        prompt,
        cancel_token,
        stream_id,
    } = params;

    let request = match config.provider {
        Provider::OpenAi | Provider::Ollama => {
            let (url, body) = chat_completions_request(&config, &prompt);
            client.post(url).json(&body)
        }
        Provider::Gemini => {
            let (url, body) = generate_content_request(&config, &prompt);
            client.post(url).json(&body)
        }
    };
    let request = add_auth_headers(request, config.provider, &config.api_key)
        .header("Content-Type", "application/json");

    debug!(provider = %config.provider, model = %config.model, stream_id, "opening stream");

    match request.send().await {
        Ok(response) => {
            if !response.status().is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                let _ = tx.send((StreamMessage::Error(format_api_error(&error_text)), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                if cancel_token.is_cancelled() {
                    return;
                }

                let chunk_bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx
                            .send((StreamMessage::Error(format_api_error(&e.to_string())), stream_id));
                        let _ = tx.send((StreamMessage::End, stream_id));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk_bytes);

                while let Some(newline_pos) = memchr(b'\n', &buffer) {
                    let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                        Ok(s) => s.trim().to_string(),
                        Err(e) => {
                            warn!(stream_id, "invalid UTF-8 in stream: {e}");
                            buffer.drain(..=newline_pos);
                            continue;
                        }
                    };
                    buffer.drain(..=newline_pos);

                    let should_end = match config.provider {
                        Provider::OpenAi | Provider::Ollama => {
                            process_chat_line(&line, &tx, stream_id)
                        }
                        Provider::Gemini => process_gemini_line(&line, &tx, stream_id),
                    };
                    if should_end {
                        return;
                    }
                }
            }

            // Connection closed without a sentinel; this is Gemini's
            // normal end-of-stream and a tolerable one for the rest.
            let _ = tx.send((StreamMessage::End, stream_id));
        }
        Err(e) => {
            let _ = tx.send((StreamMessage::Error(format_api_error(&e.to_string())), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
        }
    }
}

fn chat_completions_request(config: &RequestConfig, prompt: &str) -> (String, ChatRequest) {
    let url = construct_api_url(&config.base_url, "chat/completions");
    let body = ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: config.system_prompt.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ],
        stream: true,
    };
    (url, body)
}

fn generate_content_request(config: &RequestConfig, prompt: &str) -> (String, GenerateContentRequest) {
    let endpoint = format!("models/{}:streamGenerateContent", config.model);
    let url = format!(
        "{}?alt=sse",
        construct_api_url(&config.base_url, &endpoint)
    );
    let system_instruction = if config.system_prompt.trim().is_empty() {
        None
    } else {
        Some(GeminiInstruction {
            parts: vec![GeminiPart {
                text: config.system_prompt.clone(),
            }],
        })
    };
    let body = GenerateContentRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }],
        system_instruction,
        generation_config: GeminiGenerationConfig {
            thinking_config: GeminiThinkingConfig { thinking_budget: 0 },
        },
    };
    (url, body)
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Returns true when the stream is finished and the task should stop.
fn process_chat_line(line: &str, tx: &StreamSender, stream_id: u64) -> bool {
    let Some(payload) = extract_data_payload(line) else {
        return false;
    };

    if payload == "[DONE]" {
        let _ = tx.send((StreamMessage::End, stream_id));
        return true;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => {
            if let Some(choice) = response.choices.first() {
                if let Some(content) = &choice.delta.content {
                    let _ = tx.send((StreamMessage::Chunk(content.clone()), stream_id));
                }
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

fn process_gemini_line(line: &str, tx: &StreamSender, stream_id: u64) -> bool {
    let Some(payload) = extract_data_payload(line) else {
        return false;
    };

    match serde_json::from_str::<GenerateContentResponse>(payload) {
        Ok(response) => {
            // Gemini streams errors as a well-formed event rather than
            // a malformed one.
            if response.error.is_some() {
                let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
                return true;
            }
            for candidate in response.candidates.unwrap_or_default() {
                let parts = candidate
                    .content
                    .and_then(|content| content.parts)
                    .unwrap_or_default();
                for part in parts {
                    if let Some(text) = part.text {
                        if !text.is_empty() {
                            let _ = tx.send((StreamMessage::Chunk(text), stream_id));
                        }
                    }
                }
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                serde_json::Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{}\n```", trimmed)
    } else {
        format!("API Error:\n```\n{}\n```", trimmed)
    }
}
