//! Wire types for the two provider protocols.
//!
//! The structured chat protocol (`/api/chat`) and the legacy completion
//! protocol (`/api/generate`) answer with different shapes. Both reduce to
//! a [`RawReply`] which is normalized into the domain `ProviderReply` at
//! the client boundary: role-prefix artifacts stripped, token count taken
//! only when the protocol actually reports one.

use serde::{Deserialize, Serialize};

use murmur_types::llm::{ChatContext, Message, MessageRole};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<WireOptions>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Sampling options in the provider's `options` envelope.
#[derive(Debug, Default, Serialize)]
pub(crate) struct WireOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    pub message: ChatReplyMessage,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatReplyMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateReply {
    #[serde(default)]
    pub response: String,
}

/// One newline-delimited fragment of a streaming chat completion.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamFragment {
    #[serde(default)]
    pub message: Option<ChatReplyMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

/// Which protocol answered, carrying its raw payload.
#[derive(Debug)]
pub(crate) enum RawReply {
    Chat(ChatReply),
    Generate(GenerateReply),
}

impl RawReply {
    /// Normalize into (content, token_count).
    ///
    /// The legacy protocol reports no token statistics; its count stays
    /// `None` rather than being estimated.
    pub(crate) fn normalize(self) -> (String, Option<u32>) {
        match self {
            RawReply::Chat(reply) => (
                strip_role_prefix(&reply.message.content).to_string(),
                reply.eval_count,
            ),
            RawReply::Generate(reply) => (strip_role_prefix(&reply.response).to_string(), None),
        }
    }
}

/// Role labels smaller models sometimes echo at the start of a reply.
const ROLE_PREFIXES: &[&str] = &["assistant:", "ai:", "asistente:", "ia:"];

/// Strip a leading role label ("Assistant: ...") from reply content.
pub(crate) fn strip_role_prefix(content: &str) -> &str {
    let trimmed = content.trim_start();
    let lower = trimmed.to_lowercase();
    for prefix in ROLE_PREFIXES {
        if lower.starts_with(prefix) {
            return trimmed[prefix.len()..].trim_start();
        }
    }
    trimmed
}

pub(crate) fn wire_messages(context: &ChatContext) -> Vec<WireMessage> {
    context
        .messages
        .iter()
        .map(|m| WireMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        })
        .collect()
}

pub(crate) fn wire_options(context: &ChatContext) -> Option<WireOptions> {
    let o = &context.options;
    if o.temperature.is_none()
        && o.top_k.is_none()
        && o.top_p.is_none()
        && o.repeat_penalty.is_none()
        && o.num_predict.is_none()
    {
        return None;
    }
    Some(WireOptions {
        temperature: o.temperature,
        top_k: o.top_k,
        top_p: o.top_p,
        repeat_penalty: o.repeat_penalty,
        num_predict: o.num_predict,
    })
}

/// Flatten the role-tagged history into a single legacy-protocol prompt.
pub(crate) fn flatten_prompt(messages: &[Message]) -> String {
    let mut prompt = String::new();
    for message in messages {
        let line = match message.role {
            MessageRole::System => message.content.clone(),
            MessageRole::User => format!("User: {}", message.content),
            MessageRole::Assistant => format!("Assistant: {}", message.content),
        };
        prompt.push_str(&line);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Assistant:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_types::llm::CompletionOptions;

    #[test]
    fn test_strip_role_prefix_variants() {
        assert_eq!(strip_role_prefix("Assistant: hello"), "hello");
        assert_eq!(strip_role_prefix("  AI: hi there"), "hi there");
        assert_eq!(strip_role_prefix("Asistente: hola"), "hola");
        assert_eq!(strip_role_prefix("plain reply"), "plain reply");
        // Mid-text labels are left alone.
        assert_eq!(
            strip_role_prefix("The Assistant: role is common"),
            "The Assistant: role is common"
        );
    }

    #[test]
    fn test_normalize_chat_reply_keeps_eval_count() {
        let raw = RawReply::Chat(ChatReply {
            message: ChatReplyMessage {
                content: "Assistant: Hello!".to_string(),
            },
            eval_count: Some(42),
        });
        let (content, tokens) = raw.normalize();
        assert_eq!(content, "Hello!");
        assert_eq!(tokens, Some(42));
    }

    #[test]
    fn test_normalize_generate_reply_never_reports_tokens() {
        let raw = RawReply::Generate(GenerateReply {
            response: "AI: Hi".to_string(),
        });
        let (content, tokens) = raw.normalize();
        assert_eq!(content, "Hi");
        assert!(tokens.is_none());
    }

    #[test]
    fn test_flatten_prompt_tags_roles_and_cues_reply() {
        let messages = vec![
            Message {
                role: MessageRole::System,
                content: "Be brief.".to_string(),
            },
            Message {
                role: MessageRole::User,
                content: "Hi".to_string(),
            },
            Message {
                role: MessageRole::Assistant,
                content: "Hello".to_string(),
            },
        ];
        let prompt = flatten_prompt(&messages);
        assert!(prompt.starts_with("Be brief.\n\nUser: Hi\n\nAssistant: Hello"));
        assert!(prompt.ends_with("Assistant:"));
    }

    #[test]
    fn test_wire_options_omitted_when_all_unset() {
        let context = ChatContext {
            messages: Vec::new(),
            options: CompletionOptions {
                model: "llama3.2".to_string(),
                ..Default::default()
            },
        };
        assert!(wire_options(&context).is_none());
    }

    #[test]
    fn test_stream_fragment_parses_terminal_line() {
        let fragment: StreamFragment =
            serde_json::from_str(r#"{"done":true,"eval_count":17}"#).unwrap();
        assert!(fragment.done);
        assert_eq!(fragment.eval_count, Some(17));
        assert!(fragment.message.is_none());
    }
}
