/// Telegram rejects messages over 4096 chars; we stop well short of that so
/// the truncation notice always fits.
const MAX_MESSAGE_LEN: usize = 3900;

const TRUNCATION_NOTICE: &str = "\n\n(Truncated due to message length)";

/// Escape dynamic text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Truncate an outgoing message to the length ceiling, appending an explicit
/// notice instead of sending oversized or split messages.
pub fn clamp_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX_MESSAGE_LEN).collect();
    format!("{truncated}{TRUNCATION_NOTICE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_special_characters() {
        assert_eq!(
            escape_html("<b>Risk & Reward</b>"),
            "&lt;b&gt;Risk &amp; Reward&lt;/b&gt;"
        );
    }

    #[test]
    fn short_messages_pass_through() {
        assert_eq!(clamp_message("hello"), "hello");
    }

    #[test]
    fn long_messages_are_truncated_with_notice() {
        let long = "x".repeat(MAX_MESSAGE_LEN + 100);
        let clamped = clamp_message(&long);
        assert!(clamped.ends_with(TRUNCATION_NOTICE));
        assert_eq!(
            clamped.chars().count(),
            MAX_MESSAGE_LEN + TRUNCATION_NOTICE.chars().count()
        );
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let long = "한".repeat(MAX_MESSAGE_LEN + 1);
        let clamped = clamp_message(&long);
        assert!(clamped.starts_with('한'));
        assert!(clamped.ends_with(TRUNCATION_NOTICE));
    }
}
