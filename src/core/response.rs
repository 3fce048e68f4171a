//! Accumulation of streamed fragments and the user-visible view.
//!
//! Reasoning models (qwen3, deepseek-r1, and friends) open their
//! answer with a `<think>` block. The raw buffer keeps everything in
//! arrival order; the derived view hides an unterminated block behind
//! a placeholder and drops a terminated one entirely.

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";
pub const THINKING_PLACEHOLDER: &str = "Thinking...";

/// Ordered concatenation of every fragment received for one response.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuffer {
    raw: String,
}

/// What the overlay should render right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedView {
    pub is_thinking: bool,
    pub display_text: String,
}

impl ResponseBuffer {
    pub fn push_fragment(&mut self, fragment: &str) {
        self.raw.push_str(fragment);
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Recomputed on every change; never stored.
    pub fn derived_view(&self) -> DerivedView {
        if !self.raw.starts_with(THINK_OPEN) {
            return DerivedView {
                is_thinking: false,
                display_text: self.raw.clone(),
            };
        }

        match self.raw.find(THINK_CLOSE) {
            Some(close_pos) => DerivedView {
                is_thinking: false,
                display_text: self.raw[close_pos + THINK_CLOSE.len()..].trim().to_string(),
            },
            None => DerivedView {
                is_thinking: true,
                display_text: THINKING_PLACEHOLDER.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(raw: &str) -> ResponseBuffer {
        let mut buffer = ResponseBuffer::default();
        buffer.push_fragment(raw);
        buffer
    }

    #[test]
    fn fragments_concatenate_in_arrival_order() {
        let mut buffer = ResponseBuffer::default();
        for fragment in ["The ", "answer", " is ", "4"] {
            buffer.push_fragment(fragment);
        }
        assert_eq!(buffer.raw(), "The answer is 4");
        assert_eq!(buffer.derived_view().display_text, "The answer is 4");
    }

    #[test]
    fn empty_buffer_is_not_thinking() {
        let view = ResponseBuffer::default().derived_view();
        assert!(!view.is_thinking);
        assert_eq!(view.display_text, "");
    }

    #[test]
    fn unterminated_think_block_shows_placeholder() {
        let view = buffer_with("<think>the user wants arithmetic").derived_view();
        assert!(view.is_thinking);
        assert_eq!(view.display_text, THINKING_PLACEHOLDER);
    }

    #[test]
    fn terminated_think_block_is_stripped_and_trimmed() {
        let view = buffer_with("<think>sum is four</think>\n\n4").derived_view();
        assert!(!view.is_thinking);
        assert_eq!(view.display_text, "4");
    }

    #[test]
    fn think_marker_mid_response_is_left_alone() {
        let view = buffer_with("literally type <think> to begin").derived_view();
        assert!(!view.is_thinking);
        assert_eq!(view.display_text, "literally type <think> to begin");
    }

    #[test]
    fn partial_open_marker_is_plain_text_until_complete() {
        // A fragment boundary can split the marker itself.
        let mut buffer = buffer_with("<th");
        assert!(!buffer.derived_view().is_thinking);
        buffer.push_fragment("ink>reasoning");
        assert!(buffer.derived_view().is_thinking);
        buffer.push_fragment("</think>  done  ");
        let view = buffer.derived_view();
        assert!(!view.is_thinking);
        assert_eq!(view.display_text, "done");
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut buffer = buffer_with("<think>x</think>y");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.derived_view().display_text, "");
    }
}
