//! Chat session, message, and attachment types for Murmur.
//!
//! These types model conversations between a user and the local language
//! model: sessions, messages with their delivery lifecycle, and generated
//! attachments (currently images).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Lifecycle status of a chat session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('active', 'archived', 'deleted'))`
///
/// Active and Archived can move back and forth; Deleted is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Archived,
    Deleted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Archived => write!(f, "archived"),
            SessionStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "archived" => Ok(SessionStatus::Archived),
            "deleted" => Ok(SessionStatus::Deleted),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

/// Delivery status of a chat message.
///
/// Status only moves forward: Sent/Processing -> Delivered or Error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Processing,
    Delivered,
    Error,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageStatus::Sent => write!(f, "sent"),
            MessageStatus::Processing => write!(f, "processing"),
            MessageStatus::Delivered => write!(f, "delivered"),
            MessageStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sent" => Ok(MessageStatus::Sent),
            "processing" => Ok(MessageStatus::Processing),
            "delivered" => Ok(MessageStatus::Delivered),
            "error" => Ok(MessageStatus::Error),
            other => Err(format!("invalid message status: '{other}'")),
        }
    }
}

/// A chat session between a user and the model.
///
/// Each session is owned by exactly one user. Generation parameters
/// (model, temperature, token budget) are optional per-session overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub status: SessionStatus,
    /// Model to use for this session; falls back to the configured default.
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// A single message within a chat session.
///
/// Messages are ordered by `created_at` within a session.
/// Assistant messages carry model/token/latency metadata; a failed
/// generation keeps whatever partial content accumulated plus the error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    /// Model that produced this message (assistant messages only).
    pub model: Option<String>,
    /// Output tokens reported by the provider, when it reports them.
    pub token_count: Option<u32>,
    /// Wall-clock generation latency in milliseconds.
    pub response_ms: Option<u64>,
    /// Failure cause when status is Error.
    pub error: Option<String>,
    /// Generated artifacts, in the order they were produced.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Kind of generated artifact linked to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Image => write!(f, "image"),
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(AttachmentKind::Image),
            other => Err(format!("invalid attachment kind: '{other}'")),
        }
    }
}

/// A generated artifact owned by exactly one message.
///
/// Attachments are append-only from the orchestrator's perspective;
/// there is no cross-message sharing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub kind: AttachmentKind,
    /// Stable relative URL, e.g. `/images/<filename>`.
    pub url: String,
    pub filename: String,
    /// Prompt that produced this artifact, when applicable.
    pub prompt: Option<String>,
    /// Free-form renderer-reported metadata.
    pub metadata: Option<serde_json::Value>,
}
