//! Prompt extraction for the image renderer.
//!
//! Chat text arrives with markdown the renderer would render literally
//! into the image, so the prompt is cleaned first: code fences, inline
//! code, emphasis markers, headings, blockquote markers, and link syntax
//! are stripped, whitespace collapsed, and the result truncated. A prompt
//! that comes out too short is replaced by a fixed fallback -- the
//! renderer never receives an empty or near-empty prompt.

/// Maximum length of a cleaned prompt, in characters.
const MAX_PROMPT_CHARS: usize = 300;

/// Cleaned prompts shorter than this are replaced by the fallback.
const MIN_PROMPT_CHARS: usize = 10;

/// Generic prompt used when extraction produces nothing usable.
pub const FALLBACK_PROMPT: &str = "a beautiful scenic landscape, highly detailed, digital art";

/// Extract a renderer-ready prompt from chat text.
///
/// Strips markdown formatting, collapses whitespace, truncates to 300
/// characters (with ellipsis), and substitutes [`FALLBACK_PROMPT`] when
/// the cleaned text is under 10 characters.
pub fn extract_prompt(text: &str) -> String {
    let cleaned = strip_markdown(text);
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() < MIN_PROMPT_CHARS {
        return FALLBACK_PROMPT.to_string();
    }

    if collapsed.chars().count() > MAX_PROMPT_CHARS {
        let truncated: String = collapsed.chars().take(MAX_PROMPT_CHARS).collect();
        return format!("{truncated}…");
    }

    collapsed
}

/// Remove markdown structure, keeping the visible text.
fn strip_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_code_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();

        // Fenced code blocks are dropped entirely.
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_code_fence = !in_code_fence;
            continue;
        }
        if in_code_fence {
            continue;
        }

        // Headings and blockquote markers.
        let line = trimmed.trim_start_matches('#').trim_start_matches('>').trim_start();

        out.push_str(&strip_inline(line));
        out.push(' ');
    }

    out
}

/// Strip inline markdown: emphasis, inline code, image and link syntax.
fn strip_inline(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' | '_' | '`' | '~' => {}
            '!' if chars.peek() == Some(&'[') => {}
            '[' => {}
            ']' => {
                // Drop the "(url)" part of link syntax, keep the label.
                if chars.peek() == Some(&'(') {
                    for c in chars.by_ref() {
                        if c == ')' {
                            break;
                        }
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(
            extract_prompt("a red fox in the snow at dusk"),
            "a red fox in the snow at dusk"
        );
    }

    #[test]
    fn test_too_short_input_yields_fallback() {
        assert_eq!(extract_prompt("ok"), FALLBACK_PROMPT);
        assert_eq!(extract_prompt(""), FALLBACK_PROMPT);
        assert_eq!(extract_prompt("   hi   "), FALLBACK_PROMPT);
    }

    #[test]
    fn test_markdown_only_input_yields_fallback() {
        assert_eq!(extract_prompt("``` \n```\n**__**"), FALLBACK_PROMPT);
    }

    #[test]
    fn test_long_prose_truncated_to_300_chars_with_ellipsis() {
        let input = "word ".repeat(100); // 400+ visible chars
        let prompt = extract_prompt(&input);
        assert_eq!(prompt.chars().count(), MAX_PROMPT_CHARS + 1);
        assert!(prompt.ends_with('…'));
    }

    #[test]
    fn test_code_fences_dropped() {
        let input = "a castle on a hill\n```python\nprint('hello')\n```\nunder a full moon";
        assert_eq!(extract_prompt(input), "a castle on a hill under a full moon");
    }

    #[test]
    fn test_emphasis_and_inline_code_stripped() {
        let input = "a **bold** knight with `rusty` armor and _quiet_ resolve";
        assert_eq!(
            extract_prompt(input),
            "a bold knight with rusty armor and quiet resolve"
        );
    }

    #[test]
    fn test_headings_and_blockquotes_stripped() {
        let input = "## A portrait\n> of an old sailor\nwith weathered hands";
        assert_eq!(
            extract_prompt(input),
            "A portrait of an old sailor with weathered hands"
        );
    }

    #[test]
    fn test_link_syntax_keeps_label_drops_url() {
        let input = "a city like [Venice](https://example.com/venice) at night time";
        assert_eq!(extract_prompt(input), "a city like Venice at night time");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let input = "a    lone\n\n\ttree   on a hill";
        assert_eq!(extract_prompt(input), "a lone tree on a hill");
    }
}
