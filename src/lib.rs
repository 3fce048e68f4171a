//! Quickask is a hotkey-summoned desktop overlay for one-shot LLM
//! questions, streaming answers from OpenAI-compatible, Gemini, or
//! local Ollama endpoints.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns configuration, the per-request provider snapshot,
//!   the streaming adapter, response aggregation, and the session
//!   lifecycle.
//! - [`overlay`] holds the visibility/focus state machine, the
//!   keybinding map, the shell collaborator traits, and the runtime
//!   event loop that ties them to a session.
//! - [`api`] defines the wire payloads for the provider protocols.
//! - [`cli`] is a window-less one-shot entry point used from the
//!   terminal; the desktop shell embeds [`overlay`] instead.
//!
//! Window creation, global-hotkey registration, and markdown rendering
//! live in the embedding shell and reach the core only through the
//! traits in [`overlay::shell`].

pub mod api;
pub mod cli;
pub mod core;
pub mod overlay;
pub mod utils;
