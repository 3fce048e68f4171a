//! Shell collaborator interfaces.
//!
//! Window placement, global-hotkey registration, and the clipboard
//! belong to the embedding desktop shell; the overlay core drives them
//! through these narrow traits.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::overlay::OverlayEvent;
use crate::utils::clipboard;

/// The one process-wide toggle combination.
pub const DEFAULT_TOGGLE_HOTKEY: &str = "CommandOrControl+Shift+Space";

/// Window operations the overlay requests.
#[async_trait]
pub trait WindowControl: Send {
    async fn show(&mut self);

    /// Must be idempotent; the overlay may request it redundantly.
    async fn hide(&mut self);

    /// Resize and recenter on the primary display.
    async fn resize(&mut self, width: u32, height: u32);

    /// Move keyboard focus to the prompt field.
    async fn focus_input(&mut self);
}

/// Registers the one process-wide toggle combination. Implementations
/// deliver [`OverlayEvent::HotkeyToggle`] on the given channel and are
/// expected to unregister the combination when dropped.
pub trait HotkeyRegistrar {
    fn register_toggle(
        &mut self,
        events: mpsc::UnboundedSender<OverlayEvent>,
    ) -> Result<(), String>;
}

/// Clipboard writes, injectable for tests.
pub trait Clipboard: Send {
    fn write_text(&mut self, text: &str) -> Result<(), String>;
}

/// Writes through the operating system's copy command.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), String> {
        clipboard::write_text(text)
    }
}
