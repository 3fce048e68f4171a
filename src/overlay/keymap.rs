//! Keybindings for the visible overlay.
//!
//! The shell forwards raw key events; this module classifies them
//! into intents per mode. "Primary" means Ctrl on Linux/Windows and
//! Cmd on macOS; the shell reports whichever it saw.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        meta: false,
    };

    pub fn primary(self) -> bool {
        self.control || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::NONE
            },
        }
    }

    pub fn primary(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers {
                control: true,
                ..Modifiers::NONE
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIntent {
    Submit,
    InsertNewline,
    Hide,
    OpenSettings,
    Copy,
    Clear,
    FocusInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsIntent {
    CloseSettings,
}

pub fn chat_intent(key: &KeyEvent) -> Option<ChatIntent> {
    match key.code {
        KeyCode::Enter if key.modifiers == Modifiers::NONE => Some(ChatIntent::Submit),
        // Shift+Enter stays a literal newline in the prompt field.
        KeyCode::Enter if key.modifiers.shift && !key.modifiers.primary() => {
            Some(ChatIntent::InsertNewline)
        }
        KeyCode::Escape if key.modifiers == Modifiers::NONE => Some(ChatIntent::Hide),
        KeyCode::Char(c) if key.modifiers.primary() => match c.to_ascii_lowercase() {
            ',' => Some(ChatIntent::OpenSettings),
            'j' => Some(ChatIntent::Copy),
            'k' => Some(ChatIntent::Clear),
            'l' => Some(ChatIntent::FocusInput),
            _ => None,
        },
        _ => None,
    }
}

pub fn settings_intent(key: &KeyEvent) -> Option<SettingsIntent> {
    match key.code {
        KeyCode::Escape if key.modifiers == Modifiers::NONE => {
            Some(SettingsIntent::CloseSettings)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_submits_and_shift_enter_inserts_newline() {
        assert_eq!(
            chat_intent(&KeyEvent::plain(KeyCode::Enter)),
            Some(ChatIntent::Submit)
        );
        assert_eq!(
            chat_intent(&KeyEvent::shift(KeyCode::Enter)),
            Some(ChatIntent::InsertNewline)
        );
    }

    #[test]
    fn primary_shortcuts_map_to_session_operations() {
        assert_eq!(
            chat_intent(&KeyEvent::primary(KeyCode::Char(','))),
            Some(ChatIntent::OpenSettings)
        );
        assert_eq!(
            chat_intent(&KeyEvent::primary(KeyCode::Char('j'))),
            Some(ChatIntent::Copy)
        );
        assert_eq!(
            chat_intent(&KeyEvent::primary(KeyCode::Char('k'))),
            Some(ChatIntent::Clear)
        );
        assert_eq!(
            chat_intent(&KeyEvent::primary(KeyCode::Char('l'))),
            Some(ChatIntent::FocusInput)
        );
    }

    #[test]
    fn cmd_works_where_ctrl_does() {
        let cmd_j = KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: Modifiers {
                meta: true,
                ..Modifiers::NONE
            },
        };
        assert_eq!(chat_intent(&cmd_j), Some(ChatIntent::Copy));
    }

    #[test]
    fn plain_characters_are_not_intents() {
        assert_eq!(chat_intent(&KeyEvent::plain(KeyCode::Char('j'))), None);
        assert_eq!(chat_intent(&KeyEvent::primary(KeyCode::Char('q'))), None);
    }

    #[test]
    fn escape_hides_chat_but_only_closes_settings() {
        assert_eq!(
            chat_intent(&KeyEvent::plain(KeyCode::Escape)),
            Some(ChatIntent::Hide)
        );
        assert_eq!(
            settings_intent(&KeyEvent::plain(KeyCode::Escape)),
            Some(SettingsIntent::CloseSettings)
        );
        assert_eq!(
            settings_intent(&KeyEvent::plain(KeyCode::Enter)),
            None
        );
    }
}
