//! Session lifecycle: submit, stream, terminal outcome, clear.
//!
//! One session is live at a time. Submission hands back the
//! [`StreamParams`] for the caller to spawn (keeping this type free of
//! I/O); fragments come back through [`SessionController::apply`]
//! tagged with their stream id. Ids from superseded or cleared
//! submissions no longer match and their fragments are dropped.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::config::Config;
use crate::core::provider::RequestConfig;
use crate::core::response::{DerivedView, ResponseBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Sending,
    Streaming,
    Done,
    Errored,
}

/// One prompt/response exchange, from submission to terminal outcome.
#[derive(Debug, Default)]
pub struct Session {
    pub prompt: String,
    pub response: ResponseBuffer,
    pub status: SessionStatus,
    pub error: Option<String>,
}

pub struct SessionController {
    client: reqwest::Client,
    session: Session,
    stream_cancel_token: Option<CancellationToken>,
    current_stream_id: u64,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            session: Session::default(),
            stream_cancel_token: None,
            current_stream_id: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn prompt(&self) -> &str {
        &self.session.prompt
    }

    pub fn error(&self) -> Option<&str> {
        self.session.error.as_deref()
    }

    pub fn derived_view(&self) -> DerivedView {
        self.session.response.derived_view()
    }

    pub fn is_request_in_flight(&self) -> bool {
        matches!(
            self.session.status,
            SessionStatus::Sending | SessionStatus::Streaming
        )
    }

    /// Begin a new exchange. Returns the stream parameters to spawn,
    /// or `None` when the submission is a no-op (blank prompt, request
    /// already in flight) or failed configuration validation; in the
    /// latter case the session is already `Errored` with the message.
    pub fn submit(&mut self, prompt: &str, config: &Config) -> Option<StreamParams> {
        let prompt = prompt.trim();
        if prompt.is_empty() || self.is_request_in_flight() {
            return None;
        }

        self.session.prompt = prompt.to_string();
        self.session.response.clear();
        self.session.error = None;

        let request_config = match RequestConfig::snapshot(config) {
            Ok(request_config) => request_config,
            Err(err) => {
                self.session.status = SessionStatus::Errored;
                self.session.error = Some(err.to_string());
                return None;
            }
        };

        self.session.status = SessionStatus::Sending;
        let (cancel_token, stream_id) = self.start_new_stream();

        Some(StreamParams {
            client: self.client.clone(),
            config: request_config,
            prompt: prompt.to_string(),
            cancel_token,
            stream_id,
        })
    }

    /// Apply one stream message. Messages whose id is not the current
    /// stream's are from a superseded or cleared submission and are
    /// discarded.
    pub fn apply(&mut self, message: StreamMessage, stream_id: u64) {
        if stream_id != self.current_stream_id {
            debug!(stream_id, "dropping stale stream message");
            return;
        }
        if !self.is_request_in_flight() {
            return;
        }

        match message {
            StreamMessage::Chunk(fragment) => {
                self.session.response.push_fragment(&fragment);
                self.session.status = SessionStatus::Streaming;
            }
            StreamMessage::Error(message) => {
                self.session.status = SessionStatus::Errored;
                self.session.error = Some(message);
                self.stream_cancel_token = None;
            }
            StreamMessage::End => {
                self.session.status = SessionStatus::Done;
                self.stream_cancel_token = None;
            }
        }
    }

    /// Reset to an empty idle session. The in-flight stream, if any,
    /// is cancelled at the transport level and its id invalidated so
    /// fragments already in the channel are dropped. Idempotent.
    pub fn clear(&mut self) {
        self.cancel_current_stream();
        self.current_stream_id += 1;
        self.session = Session::default();
    }

    fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        self.cancel_current_stream();
        self.current_stream_id += 1;

        let token = CancellationToken::new();
        self.stream_cancel_token = Some(token.clone());
        (token, self.current_stream_id)
    }

    fn cancel_current_stream(&mut self) {
        if let Some(token) = &self.stream_cancel_token {
            token.cancel();
        }
        self.stream_cancel_token = None;
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}
