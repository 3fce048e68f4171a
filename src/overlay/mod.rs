//! Overlay visibility and mode handling.
//!
//! The state machine is pure: every event maps to a mode transition
//! plus a list of [`OverlayCommand`]s for the runtime to execute
//! against the shell collaborators. That keeps show/hide/focus/resize
//! policy testable without a window system.

pub mod keymap;
pub mod runtime;
pub mod shell;

use std::time::Duration;

use keymap::{chat_intent, settings_intent, ChatIntent, KeyEvent, SettingsIntent};

/// Compact layout for chat, taller layout while settings are open.
pub const COMPACT_WINDOW: (u32, u32) = (600, 450);
pub const SETTINGS_WINDOW: (u32, u32) = (600, 950);

/// Focus is requested after the window has had time to finish showing.
pub const FOCUS_SETTLE_DELAY: Duration = Duration::from_millis(200);
/// Shorter settle when returning from settings; the window is already
/// frontmost.
pub const SETTINGS_RETURN_FOCUS_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    Hidden,
    VisibleChat,
    VisibleSettings,
}

/// Inputs from the shell: the global hotkey, foreground-focus loss,
/// and keys pressed while the overlay is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    HotkeyToggle,
    FocusLost,
    Key(KeyEvent),
    InputChanged(String),
}

/// Effects for the runtime to carry out, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayCommand {
    ShowWindow,
    HideWindow,
    Resize { width: u32, height: u32 },
    FocusInput { settle: Duration },
    ClearSession,
    SubmitPrompt,
    CopyResponse,
    InsertNewline,
}

#[derive(Debug, Default)]
pub struct OverlayStateMachine {
    mode: OverlayMode,
}

impl OverlayStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn is_visible(&self) -> bool {
        self.mode != OverlayMode::Hidden
    }

    /// Advance the machine. `clear_on_show` is the clear-on-hide
    /// setting read at event time; when enabled, entering visibility
    /// from hidden resets the session.
    pub fn handle_event(
        &mut self,
        event: &OverlayEvent,
        clear_on_show: bool,
    ) -> Vec<OverlayCommand> {
        match event {
            OverlayEvent::HotkeyToggle => match self.mode {
                OverlayMode::Hidden => {
                    self.mode = OverlayMode::VisibleChat;
                    let mut commands = Vec::new();
                    if clear_on_show {
                        commands.push(OverlayCommand::ClearSession);
                    }
                    commands.push(OverlayCommand::ShowWindow);
                    commands.push(OverlayCommand::FocusInput {
                        settle: FOCUS_SETTLE_DELAY,
                    });
                    commands
                }
                OverlayMode::VisibleChat => {
                    self.mode = OverlayMode::Hidden;
                    vec![OverlayCommand::HideWindow]
                }
                OverlayMode::VisibleSettings => {
                    // Settings edits persist as they are made; nothing
                    // is lost by hiding from here.
                    self.mode = OverlayMode::Hidden;
                    vec![compact_resize(), OverlayCommand::HideWindow]
                }
            },
            OverlayEvent::FocusLost => match self.mode {
                OverlayMode::Hidden => Vec::new(),
                OverlayMode::VisibleChat => {
                    self.mode = OverlayMode::Hidden;
                    vec![OverlayCommand::HideWindow]
                }
                OverlayMode::VisibleSettings => {
                    self.mode = OverlayMode::Hidden;
                    vec![compact_resize(), OverlayCommand::HideWindow]
                }
            },
            OverlayEvent::Key(key) => match self.mode {
                OverlayMode::Hidden => Vec::new(),
                OverlayMode::VisibleChat => self.handle_chat_key(key),
                OverlayMode::VisibleSettings => self.handle_settings_key(key),
            },
            OverlayEvent::InputChanged(_) => Vec::new(),
        }
    }

    fn handle_chat_key(&mut self, key: &KeyEvent) -> Vec<OverlayCommand> {
        match chat_intent(key) {
            Some(ChatIntent::Submit) => vec![OverlayCommand::SubmitPrompt],
            Some(ChatIntent::InsertNewline) => vec![OverlayCommand::InsertNewline],
            Some(ChatIntent::Hide) => {
                self.mode = OverlayMode::Hidden;
                vec![OverlayCommand::HideWindow]
            }
            Some(ChatIntent::OpenSettings) => {
                self.mode = OverlayMode::VisibleSettings;
                let (width, height) = SETTINGS_WINDOW;
                vec![OverlayCommand::Resize { width, height }]
            }
            Some(ChatIntent::Copy) => vec![OverlayCommand::CopyResponse],
            Some(ChatIntent::Clear) => vec![
                OverlayCommand::ClearSession,
                OverlayCommand::FocusInput {
                    settle: Duration::ZERO,
                },
            ],
            Some(ChatIntent::FocusInput) => vec![OverlayCommand::FocusInput {
                settle: Duration::ZERO,
            }],
            None => Vec::new(),
        }
    }

    fn handle_settings_key(&mut self, key: &KeyEvent) -> Vec<OverlayCommand> {
        match settings_intent(key) {
            Some(SettingsIntent::CloseSettings) => {
                self.mode = OverlayMode::VisibleChat;
                vec![
                    compact_resize(),
                    OverlayCommand::FocusInput {
                        settle: SETTINGS_RETURN_FOCUS_DELAY,
                    },
                ]
            }
            None => Vec::new(),
        }
    }
}

fn compact_resize() -> OverlayCommand {
    let (width, height) = COMPACT_WINDOW;
    OverlayCommand::Resize { width, height }
}
