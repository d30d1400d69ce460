//! Provider request/response types for Murmur.
//!
//! These types model the data shapes for interactions with the local
//! language-model provider: completion contexts, sampling options, the
//! normalized reply both wire protocols reduce to, and streaming chunks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a model conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single role-tagged message in a provider conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Sampling options for a completion request.
///
/// Everything except `model` is optional; unset fields are omitted from
/// the wire request so the provider applies its own defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
    /// Output token budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Conversation context sent to the provider: role-tagged history plus
/// sampling options. The structured protocol consumes it as-is; the legacy
/// fallback flattens the history into a single prompt.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub messages: Vec<Message>,
    pub options: CompletionOptions,
}

/// The normalized reply both provider protocols are reduced to.
///
/// `token_count` is `None` when the protocol that answered does not report
/// one (the legacy completion protocol); it is never estimated.
/// `elapsed_ms` is always wall-clock measured by the client, not trusted
/// from the remote provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderReply {
    pub content: String,
    pub model: String,
    pub token_count: Option<u32>,
    pub elapsed_ms: u64,
}

/// One incremental chunk of a streaming completion.
///
/// Content-bearing chunks carry a delta; the terminal chunk has
/// `done == true` and may carry final token statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub delta: String,
    pub done: bool,
    pub token_count: Option<u32>,
}

impl StreamChunk {
    /// A content-bearing chunk.
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            delta: text.into(),
            done: false,
            token_count: None,
        }
    }

    /// The terminal chunk, optionally carrying final token statistics.
    pub fn done(token_count: Option<u32>) -> Self {
        Self {
            delta: String::new(),
            done: true,
            token_count,
        }
    }
}

/// Errors from provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Both completion protocols failed; carries the last HTTP status observed.
    #[error("provider error: HTTP {status} {status_text}")]
    Http { status: u16, status_text: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    /// The stream closed without ever delivering content.
    #[error("stream closed without content")]
    EmptyStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let role = MessageRole::Assistant;
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MessageRole::Assistant);
    }

    #[test]
    fn test_completion_options_omit_unset_fields() {
        let options = CompletionOptions {
            model: "llama3.2".to_string(),
            temperature: Some(0.7),
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("temperature"));
        assert!(!json.contains("top_k"));
        assert!(!json.contains("num_predict"));
    }

    #[test]
    fn test_stream_chunk_constructors() {
        let chunk = StreamChunk::delta("Hel");
        assert_eq!(chunk.delta, "Hel");
        assert!(!chunk.done);
        assert!(chunk.token_count.is_none());

        let terminal = StreamChunk::done(Some(12));
        assert!(terminal.done);
        assert!(terminal.delta.is_empty());
        assert_eq!(terminal.token_count, Some(12));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Http {
            status: 404,
            status_text: "Not Found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Not Found"));
    }
}
