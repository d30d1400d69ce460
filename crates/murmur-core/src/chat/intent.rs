//! Keyword-based image generation intent classifier.
//!
//! `is_image_generation_request` decides whether a user message should be
//! routed to the image dispatcher instead of the text provider. It is a
//! fixed keyword heuristic, not an ML classifier: a false negative falls
//! through to plain text completion, a false positive routes harmlessly to
//! image generation. The keyword tables are a tunable list, currently
//! covering English and Spanish.

/// Verbs that signal a request to produce something.
const ACTION_WORDS: &[&str] = &[
    // English
    "generate", "create", "draw", "make", "paint", "render",
    // Spanish
    "genera", "generar", "crea", "crear", "dibuja", "dibujar", "haz", "hacer", "pinta", "pintar",
];

/// Nouns that signal the something is a picture.
const SUBJECT_WORDS: &[&str] = &[
    // English
    "image", "picture", "photo", "drawing", "painting", "illustration",
    // Spanish
    "imagen", "foto", "fotografia", "fotografía", "dibujo", "pintura", "ilustracion", "ilustración",
];

/// Returns true when the text looks like a request to generate an image.
///
/// Pure function: repeated calls with identical input return identical
/// output. Matching is case-insensitive and requires both an action word
/// and a subject word somewhere in the text.
pub fn is_image_generation_request(text: &str) -> bool {
    let lower = text.to_lowercase();

    let has_action = ACTION_WORDS.iter().any(|w| contains_word(&lower, w));
    let has_subject = SUBJECT_WORDS.iter().any(|w| contains_word(&lower, w));

    has_action && has_subject
}

/// Token-prefix check: simple plurals and short inflections still match
/// ("images", "pictures"), but longer derivations do not ("creative",
/// "photography"), and keywords never match mid-word.
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric() && c != 'á' && c != 'é' && c != 'í' && c != 'ó' && c != 'ú')
        .any(|token| token == word || token.starts_with(word) && token.len() <= word.len() + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_image_requests() {
        assert!(is_image_generation_request("Generate an image of a cat"));
        assert!(is_image_generation_request("please draw a picture of the sea"));
        assert!(is_image_generation_request("Can you create a photo of Mars?"));
        assert!(is_image_generation_request("make me an illustration of a dragon"));
    }

    #[test]
    fn test_spanish_image_requests() {
        assert!(is_image_generation_request("Genera una imagen de un gato"));
        assert!(is_image_generation_request("dibuja una foto del mar"));
        assert!(is_image_generation_request("crea una ilustración de un dragón"));
    }

    #[test]
    fn test_plain_text_not_classified() {
        assert!(!is_image_generation_request("What is the capital of France?"));
        assert!(!is_image_generation_request("Tell me about photography history"));
        assert!(!is_image_generation_request("generate a summary of this text"));
        assert!(!is_image_generation_request("I saw a nice picture yesterday"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_image_generation_request("GENERATE AN IMAGE OF A DOG"));
        assert!(is_image_generation_request("Dibuja Una IMAGEN"));
    }

    #[test]
    fn test_classifier_is_idempotent() {
        let input = "draw a picture of a lighthouse";
        let first = is_image_generation_request(input);
        for _ in 0..10 {
            assert_eq!(is_image_generation_request(input), first);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(!is_image_generation_request(""));
        assert!(!is_image_generation_request("   "));
    }
}
