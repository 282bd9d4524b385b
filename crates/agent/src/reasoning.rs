//! Reasoning-trace removal for replies from "thinking" models.

const THINK_CLOSE: &str = "</think>";

/// The answer part of a reply: everything after the last `</think>`,
/// trimmed. Replies without a reasoning block come back unchanged.
pub fn strip_reasoning(content: &str) -> String {
    match content.rfind(THINK_CLOSE) {
        Some(idx) => content[idx + THINK_CLOSE.len()..].trim().to_string(),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_think_block() {
        let reply = "<think>\nThe user greets me.\n</think>\n\nHello there!";
        assert_eq!(strip_reasoning(reply), "Hello there!");
    }

    #[test]
    fn passes_plain_reply_through() {
        assert_eq!(strip_reasoning("  just text "), "  just text ");
    }

    #[test]
    fn uses_last_closing_tag() {
        assert_eq!(strip_reasoning("<think>a</think>b</think> c"), "c");
    }

    #[test]
    fn empty_answer_after_reasoning() {
        assert_eq!(strip_reasoning("<think>only thoughts</think>"), "");
    }
}
