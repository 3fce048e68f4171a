//! Glue between the overlay state machine, the session controller,
//! and the shell collaborators.
//!
//! The runtime owns the single event loop: shell events and stream
//! fragments are interleaved on one task, so no state is touched from
//! two places at once. Awaiting the next event is the only suspension
//! point.

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::warn;

use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::Config;
use crate::core::copy::{prepare_copy_text, CopyIndicator};
use crate::core::session::SessionController;
use crate::overlay::shell::{Clipboard, WindowControl};
use crate::overlay::{OverlayCommand, OverlayEvent, OverlayMode, OverlayStateMachine};

pub struct OverlayRuntime<W: WindowControl, C: Clipboard> {
    machine: OverlayStateMachine,
    controller: SessionController,
    stream_service: ChatStreamService,
    stream_rx: mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    events_rx: mpsc::UnboundedReceiver<OverlayEvent>,
    window: W,
    clipboard: C,
    copy_indicator: CopyIndicator,
    config: Config,
    input: String,
}

impl<W: WindowControl, C: Clipboard> OverlayRuntime<W, C> {
    /// Build the runtime and hand back the event sender for the shell
    /// collaborators (hotkey, window focus, key forwarding).
    pub fn new(
        config: Config,
        window: W,
        clipboard: C,
    ) -> (Self, mpsc::UnboundedSender<OverlayEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stream_service, stream_rx) = ChatStreamService::new();
        let runtime = Self {
            machine: OverlayStateMachine::new(),
            controller: SessionController::new(),
            stream_service,
            stream_rx,
            events_rx,
            window,
            clipboard,
            copy_indicator: CopyIndicator::default(),
            config,
            input: String::new(),
        };
        (runtime, events_tx)
    }

    /// Run until every event sender is dropped.
    pub async fn run(&mut self) {
        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => break,
                    }
                }
                Some((message, stream_id)) = self.stream_rx.recv() => {
                    self.apply_stream_message(message, stream_id);
                }
            }
        }
    }

    pub async fn handle_event(&mut self, event: OverlayEvent) {
        match event {
            OverlayEvent::InputChanged(text) => self.input = text,
            event => {
                let clear_on_show = self.config.clear_on_hide();
                for command in self.machine.handle_event(&event, clear_on_show) {
                    self.execute(command).await;
                }
            }
        }
    }

    /// Feed one provider stream message into the session.
    pub fn apply_stream_message(&mut self, message: StreamMessage, stream_id: u64) {
        self.controller.apply(message, stream_id);
    }

    async fn execute(&mut self, command: OverlayCommand) {
        match command {
            OverlayCommand::ShowWindow => self.window.show().await,
            OverlayCommand::HideWindow => self.window.hide().await,
            OverlayCommand::Resize { width, height } => {
                self.window.resize(width, height).await
            }
            OverlayCommand::FocusInput { settle } => {
                if !settle.is_zero() {
                    tokio::time::sleep(settle).await;
                }
                self.window.focus_input().await;
            }
            OverlayCommand::ClearSession => {
                self.controller.clear();
                self.input.clear();
            }
            OverlayCommand::SubmitPrompt => {
                if let Some(params) = self.controller.submit(&self.input, &self.config) {
                    self.stream_service.spawn_stream(params);
                }
            }
            OverlayCommand::InsertNewline => self.input.push('\n'),
            OverlayCommand::CopyResponse => self.copy_response(),
        }
    }

    fn copy_response(&mut self) {
        let view = self.controller.derived_view();
        if view.is_thinking || view.display_text.is_empty() {
            return;
        }
        let payload = prepare_copy_text(&view.display_text);
        match self.clipboard.write_text(&payload) {
            Ok(()) => self.copy_indicator.arm(Instant::now()),
            Err(e) => warn!("clipboard copy failed: {e}"),
        }
    }

    pub fn mode(&self) -> OverlayMode {
        self.machine.mode()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn copy_feedback_active(&self) -> bool {
        self.copy_indicator.is_active(Instant::now())
    }

    /// Apply a settings edit and persist it immediately, so every
    /// completed write is visible to the next configuration read.
    pub fn update_config(&mut self, edit: impl FnOnce(&mut Config)) {
        edit(&mut self.config);
        if let Err(e) = self.config.save() {
            warn!("failed to persist settings: {e}");
        }
    }

    #[cfg(test)]
    fn controller_mut(&mut self) -> &mut SessionController {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::provider::Provider;
    use crate::core::session::SessionStatus;
    use crate::overlay::keymap::{KeyCode, KeyEvent};
    use crate::overlay::shell::HotkeyRegistrar;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeWindow {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl WindowControl for FakeWindow {
        async fn show(&mut self) {
            self.calls.lock().unwrap().push("show".to_string());
        }
        async fn hide(&mut self) {
            self.calls.lock().unwrap().push("hide".to_string());
        }
        async fn resize(&mut self, width: u32, height: u32) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("resize {width}x{height}"));
        }
        async fn focus_input(&mut self) {
            self.calls.lock().unwrap().push("focus".to_string());
        }
    }

    #[derive(Clone, Default)]
    struct FakeClipboard {
        texts: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Clipboard for FakeClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), String> {
            if self.fail {
                return Err("clipboard unavailable".to_string());
            }
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn ollama_config() -> Config {
        Config {
            provider: Provider::Ollama,
            ..Config::default()
        }
    }

    fn runtime_with(
        config: Config,
    ) -> (
        OverlayRuntime<FakeWindow, FakeClipboard>,
        Arc<Mutex<Vec<String>>>,
        Arc<Mutex<Vec<String>>>,
    ) {
        let window = FakeWindow::default();
        let clipboard = FakeClipboard::default();
        let window_calls = window.calls.clone();
        let clipboard_texts = clipboard.texts.clone();
        let (runtime, _events_tx) = OverlayRuntime::new(config, window, clipboard);
        (runtime, window_calls, clipboard_texts)
    }

    /// Drive a prior exchange to `Done` without touching the network.
    fn seed_done_session(
        runtime: &mut OverlayRuntime<FakeWindow, FakeClipboard>,
        response: &str,
    ) {
        let params = runtime
            .controller_mut()
            .submit("seed prompt", &ollama_config())
            .expect("seed submit");
        runtime.apply_stream_message(StreamMessage::Chunk(response.to_string()), params.stream_id);
        runtime.apply_stream_message(StreamMessage::End, params.stream_id);
        assert_eq!(runtime.controller().status(), SessionStatus::Done);
    }

    #[tokio::test]
    async fn toggle_with_clear_on_show_resets_prior_session() {
        let (mut runtime, window_calls, _) = runtime_with(ollama_config());
        seed_done_session(&mut runtime, "4");

        runtime.handle_event(OverlayEvent::HotkeyToggle).await;

        assert_eq!(runtime.mode(), OverlayMode::VisibleChat);
        assert_eq!(runtime.controller().status(), SessionStatus::Idle);
        assert!(runtime.controller().session().response.is_empty());
        assert_eq!(&*window_calls.lock().unwrap(), &["show", "focus"]);
    }

    #[tokio::test]
    async fn toggle_without_clear_on_show_keeps_the_answer() {
        let config = Config {
            clear_on_hide: Some(false),
            ..ollama_config()
        };
        let (mut runtime, _, _) = runtime_with(config);
        seed_done_session(&mut runtime, "4");

        runtime.handle_event(OverlayEvent::HotkeyToggle).await;
        assert_eq!(runtime.controller().status(), SessionStatus::Done);
        assert_eq!(runtime.controller().derived_view().display_text, "4");
    }

    #[tokio::test]
    async fn submit_without_api_key_errors_inline() {
        let (mut runtime, _, _) = runtime_with(Config::default());
        runtime.handle_event(OverlayEvent::HotkeyToggle).await;
        runtime
            .handle_event(OverlayEvent::InputChanged("2+2?".to_string()))
            .await;
        runtime
            .handle_event(OverlayEvent::Key(KeyEvent::plain(KeyCode::Enter)))
            .await;

        assert_eq!(runtime.controller().status(), SessionStatus::Errored);
        assert!(runtime
            .controller()
            .error()
            .unwrap()
            .contains("API key not configured"));
    }

    #[tokio::test]
    async fn copy_strips_fences_and_arms_feedback() {
        let (mut runtime, _, clipboard_texts) = runtime_with(ollama_config());
        runtime.handle_event(OverlayEvent::HotkeyToggle).await;
        seed_done_session(&mut runtime, "```sh\nls -la\n```");

        runtime
            .handle_event(OverlayEvent::Key(KeyEvent::primary(KeyCode::Char('j'))))
            .await;

        assert_eq!(&*clipboard_texts.lock().unwrap(), &["ls -la"]);
        assert!(runtime.copy_feedback_active());
    }

    #[tokio::test]
    async fn copy_failure_is_silent() {
        let window = FakeWindow::default();
        let clipboard = FakeClipboard {
            fail: true,
            ..FakeClipboard::default()
        };
        let (mut runtime, _events_tx) =
            OverlayRuntime::new(ollama_config(), window, clipboard);
        runtime.handle_event(OverlayEvent::HotkeyToggle).await;
        seed_done_session(&mut runtime, "4");

        runtime
            .handle_event(OverlayEvent::Key(KeyEvent::primary(KeyCode::Char('j'))))
            .await;
        assert!(!runtime.copy_feedback_active());
        assert_eq!(runtime.controller().status(), SessionStatus::Done);
    }

    #[tokio::test]
    async fn clear_shortcut_empties_session_and_input() {
        let (mut runtime, window_calls, _) = runtime_with(ollama_config());
        runtime.handle_event(OverlayEvent::HotkeyToggle).await;
        runtime
            .handle_event(OverlayEvent::InputChanged("pending text".to_string()))
            .await;

        runtime
            .handle_event(OverlayEvent::Key(KeyEvent::primary(KeyCode::Char('k'))))
            .await;

        assert_eq!(runtime.input(), "");
        assert_eq!(runtime.controller().status(), SessionStatus::Idle);
        assert_eq!(window_calls.lock().unwrap().last().unwrap(), "focus");
    }

    #[tokio::test]
    async fn settings_round_trip_resizes_the_window() {
        let (mut runtime, window_calls, _) = runtime_with(ollama_config());
        runtime.handle_event(OverlayEvent::HotkeyToggle).await;
        runtime
            .handle_event(OverlayEvent::Key(KeyEvent::primary(KeyCode::Char(','))))
            .await;
        assert_eq!(runtime.mode(), OverlayMode::VisibleSettings);

        runtime
            .handle_event(OverlayEvent::Key(KeyEvent::plain(KeyCode::Escape)))
            .await;
        assert_eq!(runtime.mode(), OverlayMode::VisibleChat);

        let calls = window_calls.lock().unwrap();
        assert!(calls.contains(&"resize 600x950".to_string()));
        assert!(calls.contains(&"resize 600x450".to_string()));
    }

    #[tokio::test]
    async fn run_loop_processes_events_until_senders_drop() {
        let window = FakeWindow::default();
        let window_calls = window.calls.clone();
        let (mut runtime, events_tx) =
            OverlayRuntime::new(ollama_config(), window, FakeClipboard::default());

        events_tx.send(OverlayEvent::HotkeyToggle).unwrap();
        events_tx.send(OverlayEvent::FocusLost).unwrap();
        drop(events_tx);

        runtime.run().await;
        assert_eq!(runtime.mode(), OverlayMode::Hidden);
        assert_eq!(&*window_calls.lock().unwrap(), &["show", "focus", "hide"]);
    }

    struct FakeHotkey;

    impl HotkeyRegistrar for FakeHotkey {
        fn register_toggle(
            &mut self,
            events: mpsc::UnboundedSender<OverlayEvent>,
        ) -> Result<(), String> {
            events
                .send(OverlayEvent::HotkeyToggle)
                .map_err(|e| e.to_string())
        }
    }

    #[tokio::test]
    async fn registered_hotkey_summons_the_overlay() {
        let (mut runtime, events_tx) = OverlayRuntime::new(
            ollama_config(),
            FakeWindow::default(),
            FakeClipboard::default(),
        );

        FakeHotkey.register_toggle(events_tx.clone()).unwrap();
        drop(events_tx);

        runtime.run().await;
        assert_eq!(runtime.mode(), OverlayMode::VisibleChat);
    }
}
