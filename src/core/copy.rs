//! Copy payload preparation and the transient "Copied!" indicator.

use std::time::{Duration, Instant};

/// How long the copy affordance reports success.
pub const COPY_FEEDBACK_WINDOW: Duration = Duration::from_secs(2);

/// Strip fenced code-block delimiters (with any language tag) and trim
/// the result. A response that is a single fenced snippet copies as
/// the bare code, ready to paste into a shell.
pub fn prepare_copy_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        let tag_len: usize = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(|c| c.len_utf8())
            .sum();
        rest = &rest[tag_len..];
        if let Some(stripped) = rest.strip_prefix('\n') {
            rest = stripped;
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Success flag for the copy affordance. Armed on a successful copy,
/// it stays visible for [`COPY_FEEDBACK_WINDOW`] regardless of other
/// state changes; copying again restarts the window.
#[derive(Debug, Default)]
pub struct CopyIndicator {
    armed_at: Option<Instant>,
}

impl CopyIndicator {
    pub fn arm(&mut self, now: Instant) {
        self.armed_at = Some(now);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.armed_at
            .map(|armed| now.duration_since(armed) < COPY_FEEDBACK_WINDOW)
            .unwrap_or(false)
    }
}
