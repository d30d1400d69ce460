//! Chat endpoints: blocking exchange and SSE streaming.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::Instrument;
use uuid::Uuid;

use murmur_core::chat::service::ChatExchange;
use murmur_observe::genai_attrs;
use murmur_types::chat::{ChatMessage, ChatSession, MessageStatus};
use murmur_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::extractors::UserId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Existing session to continue; omitted to start a fresh one.
    pub session_id: Option<Uuid>,
    pub message: String,
    /// Per-request model override.
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatExchangeBody {
    pub session: ChatSession,
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    pub is_image_generation: bool,
}

/// POST /api/v1/chat — run one exchange and return it whole.
pub async fn send_message(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(body): Json<ChatRequest>,
) -> Result<ApiResponse<ChatExchangeBody>, AppError> {
    let span = tracing::info_span!(
        "chat_exchange",
        { genai_attrs::GEN_AI_OPERATION_NAME } = genai_attrs::OP_CHAT,
        { genai_attrs::GEN_AI_PROVIDER_NAME } = genai_attrs::PROVIDER_OLLAMA,
        { genai_attrs::GEN_AI_REQUEST_MODEL } = body.model.as_deref().unwrap_or(""),
    );

    let exchange = state
        .chat_service
        .send_message(user_id, body.session_id, &body.message, body.model)
        .instrument(span)
        .await?;

    let is_image_generation = exchange.is_image_generation();
    Ok(ApiResponse::success(ChatExchangeBody {
        session: exchange.session,
        user_message: exchange.user_message,
        assistant_message: exchange.assistant_message,
        is_image_generation,
    }))
}

/// Events relayed from the exchange task to the SSE body.
#[derive(Debug)]
enum StreamEvent {
    Token { token: String, full_text: String },
    Attachment { attachments: serde_json::Value },
    Done { session_id: Uuid },
    Error(String),
}

/// The trailing events for a finished exchange. Exactly one terminal event
/// (`Done` or `Error`) closes every list, whatever happened before it.
fn exchange_events(result: Result<ChatExchange, ChatError>) -> Vec<StreamEvent> {
    match result {
        Ok(exchange) => {
            let mut events = Vec::new();
            if exchange.is_image_generation() {
                events.push(StreamEvent::Attachment {
                    attachments: json!(exchange.assistant_message.attachments),
                });
            }
            if exchange.assistant_message.status == MessageStatus::Error {
                let message = exchange
                    .assistant_message
                    .error
                    .unwrap_or_else(|| "exchange failed".to_string());
                events.push(StreamEvent::Error(message));
            } else {
                events.push(StreamEvent::Done {
                    session_id: exchange.session.id,
                });
            }
            events
        }
        Err(e) => vec![StreamEvent::Error(e.to_string())],
    }
}

/// Wire form of one stream event: SSE event name plus JSON payload.
fn render_event(event: &StreamEvent) -> (&'static str, serde_json::Value) {
    match event {
        StreamEvent::Token { token, full_text } => (
            "token",
            json!({ "token": token, "full_text": full_text, "done": false }),
        ),
        StreamEvent::Attachment { attachments } => (
            "attachment",
            json!({ "attachments": attachments, "is_image_generation": true }),
        ),
        StreamEvent::Done { session_id } => {
            ("done", json!({ "done": true, "session_id": session_id }))
        }
        StreamEvent::Error(message) => ("error", json!({ "error": message, "done": true })),
    }
}

/// Drain the channel into SSE events; ends when the sender side drops.
fn event_stream(
    mut rx: UnboundedReceiver<StreamEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let (name, payload) = render_event(&event);
            yield Ok::<_, Infallible>(Event::default().event(name).data(payload.to_string()));
        }
    }
}

/// POST /api/v1/chat/stream — run one exchange, streaming tokens over SSE.
///
/// The exchange runs in a spawned task so persistence completes even if
/// the client disconnects mid-stream; tokens cross over an unbounded
/// channel. The client always receives a terminal `done` or `error` event.
pub async fn send_message_streaming(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(body): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<StreamEvent>();

    let span = tracing::info_span!(
        "chat_stream",
        { genai_attrs::GEN_AI_OPERATION_NAME } = genai_attrs::OP_CHAT,
        { genai_attrs::GEN_AI_PROVIDER_NAME } = genai_attrs::PROVIDER_OLLAMA,
        { genai_attrs::GEN_AI_REQUEST_MODEL } = body.model.as_deref().unwrap_or(""),
    );

    let service = state.chat_service.clone();
    let token_tx = tx.clone();
    tokio::spawn(
        async move {
            let result = service
                .send_message_streaming(
                    user_id,
                    body.session_id,
                    &body.message,
                    body.model,
                    |token, full_text| {
                        let _ = token_tx.send(StreamEvent::Token {
                            token: token.to_string(),
                            full_text: full_text.to_string(),
                        });
                    },
                )
                .await;

            for event in exchange_events(result) {
                let _ = tx.send(event);
            }
        }
        .instrument(span),
    );

    Sse::new(event_stream(rx)).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures_util::StreamExt;
    use murmur_types::chat::{Attachment, AttachmentKind, MessageRole, SessionStatus};

    fn session() -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            title: Some("Weekend plans".to_string()),
            status: SessionStatus::Active,
            model: None,
            temperature: None,
            max_tokens: None,
            created_at: now,
            last_activity_at: now,
        }
    }

    fn message(session_id: Uuid, role: MessageRole, status: MessageStatus) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role,
            content: "hello".to_string(),
            status,
            created_at: Utc::now(),
            model: None,
            token_count: None,
            response_ms: None,
            error: None,
            attachments: Vec::new(),
        }
    }

    fn exchange(assistant: ChatMessage) -> ChatExchange {
        let session = session();
        ChatExchange {
            user_message: message(session.id, MessageRole::User, MessageStatus::Sent),
            assistant_message: assistant,
            session,
        }
    }

    #[test]
    fn test_successful_exchange_ends_with_done() {
        let ex = exchange(message(Uuid::now_v7(), MessageRole::Assistant, MessageStatus::Delivered));
        let session_id = ex.session.id;

        let events = exchange_events(Ok(ex));
        assert_eq!(events.len(), 1);
        let (name, payload) = render_event(&events[0]);
        assert_eq!(name, "done");
        assert_eq!(payload["done"], true);
        assert_eq!(payload["session_id"], json!(session_id));
    }

    #[test]
    fn test_image_exchange_emits_attachment_then_done() {
        let mut assistant = message(Uuid::now_v7(), MessageRole::Assistant, MessageStatus::Delivered);
        assistant.attachments.push(Attachment {
            id: Uuid::now_v7(),
            kind: AttachmentKind::Image,
            url: "/images/a.png".to_string(),
            filename: "a.png".to_string(),
            prompt: Some("a fox".to_string()),
            metadata: None,
        });

        let events = exchange_events(Ok(exchange(assistant)));
        assert_eq!(events.len(), 2);

        let (name, payload) = render_event(&events[0]);
        assert_eq!(name, "attachment");
        assert_eq!(payload["is_image_generation"], true);
        assert_eq!(payload["attachments"][0]["url"], "/images/a.png");

        let (name, _) = render_event(&events[1]);
        assert_eq!(name, "done");
    }

    #[test]
    fn test_provider_failure_ends_with_error() {
        let mut assistant = message(Uuid::now_v7(), MessageRole::Assistant, MessageStatus::Error);
        assistant.error = Some("transport error: connection reset".to_string());

        let events = exchange_events(Ok(exchange(assistant)));
        assert_eq!(events.len(), 1);
        let (name, payload) = render_event(&events[0]);
        assert_eq!(name, "error");
        assert_eq!(payload["done"], true);
        assert!(payload["error"].as_str().unwrap().contains("connection reset"));
    }

    #[test]
    fn test_session_resolution_failure_ends_with_error() {
        let events = exchange_events(Err(ChatError::NotFound));
        assert_eq!(events.len(), 1);
        let (name, payload) = render_event(&events[0]);
        assert_eq!(name, "error");
        assert_eq!(payload["done"], true);
        assert_eq!(payload["error"], "session not found");
    }

    #[test]
    fn test_token_event_wire_shape() {
        let event = StreamEvent::Token {
            token: "Hel".to_string(),
            full_text: "Hel".to_string(),
        };
        let (name, payload) = render_event(&event);
        assert_eq!(name, "token");
        assert_eq!(payload["token"], "Hel");
        assert_eq!(payload["full_text"], "Hel");
        assert_eq!(payload["done"], false);
    }

    #[tokio::test]
    async fn test_event_stream_closes_after_terminal_event() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(StreamEvent::Token {
            token: "Hi".to_string(),
            full_text: "Hi".to_string(),
        })
        .unwrap();
        tx.send(StreamEvent::Done {
            session_id: Uuid::now_v7(),
        })
        .unwrap();
        drop(tx);

        let events: Vec<_> = event_stream(rx).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }
}
