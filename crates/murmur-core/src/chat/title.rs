//! Session title derivation.
//!
//! New sessions get a title derived from the first few words of the first
//! user message, the way chat UIs name conversations. Pure function, no
//! model call involved.

/// Maximum number of words taken from the message.
const TITLE_WORDS: usize = 5;

/// Hard cap on title length in characters.
const TITLE_MAX_CHARS: usize = 50;

/// Derive a display title from the first user message.
///
/// Takes the first five words, strips surrounding whitespace, and caps the
/// result at 50 characters with an ellipsis. Empty or whitespace-only input
/// yields "New conversation".
pub fn derive_title(first_message: &str) -> String {
    let words: Vec<&str> = first_message.split_whitespace().take(TITLE_WORDS).collect();
    if words.is_empty() {
        return "New conversation".to_string();
    }

    let mut title = words.join(" ");
    let truncated = first_message.split_whitespace().count() > TITLE_WORDS;

    if title.chars().count() > TITLE_MAX_CHARS {
        title = title.chars().take(TITLE_MAX_CHARS).collect();
        title.push('…');
    } else if truncated {
        title.push('…');
    }

    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_used_verbatim() {
        assert_eq!(derive_title("Hi"), "Hi");
        assert_eq!(derive_title("Plan my trip"), "Plan my trip");
    }

    #[test]
    fn test_long_message_takes_five_words() {
        let title = derive_title("Tell me about the history of the Roman empire");
        assert_eq!(title, "Tell me about the history…");
    }

    #[test]
    fn test_very_long_words_capped_at_fifty_chars() {
        let message = "a".repeat(80);
        let title = derive_title(&message);
        assert_eq!(title.chars().count(), 51); // 50 chars + ellipsis
        assert!(title.ends_with('…'));
    }

    #[test]
    fn test_empty_message_fallback() {
        assert_eq!(derive_title(""), "New conversation");
        assert_eq!(derive_title("   \n\t "), "New conversation");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(derive_title("  Hello   there \n friend  "), "Hello there friend");
    }
}
