//! Chat orchestration service.
//!
//! `ChatService` owns the full lifecycle of a conversational exchange:
//! resolve or create the session, persist the user message, derive a title
//! for fresh sessions, route by intent to the text provider or the image
//! dispatcher, persist the assistant message, and bump session activity.
//!
//! Failure semantics are asymmetric on purpose. Ownership and lookup
//! failures abort before any write. Once the user message is durable,
//! provider and renderer failures never propagate: they are captured on an
//! Error-status assistant message (with any partial content preserved) and
//! the exchange still returns Ok.

use chrono::Utc;
use uuid::Uuid;

use murmur_types::chat::{
    Attachment, AttachmentKind, ChatMessage, ChatSession, MessageRole, MessageStatus,
    SessionStatus,
};
use murmur_types::config::ProviderConfig;
use murmur_types::error::ChatError;
use murmur_types::image::ImageRequest;
use murmur_types::llm::{ChatContext, CompletionOptions, Message};

use crate::chat::intent::is_image_generation_request;
use crate::chat::repository::ChatRepository;
use crate::chat::title::derive_title;
use crate::image::dispatcher::ImageDispatcher;
use crate::image::prompt::extract_prompt;
use crate::image::renderer::ImageRenderer;
use crate::image::store::ImageStore;
use crate::llm::provider::LlmProvider;
use crate::llm::relay::relay;

/// Assistant text accompanying a successful image generation.
const IMAGE_CAPTION: &str = "Here is the image you asked for.";

/// Result of one complete exchange: the (possibly fresh) session plus the
/// persisted user and assistant messages.
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub session: ChatSession,
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
}

impl ChatExchange {
    /// True when the assistant turn was an image generation.
    pub fn is_image_generation(&self) -> bool {
        !self.assistant_message.attachments.is_empty()
    }
}

/// Orchestrates chat exchanges across the repository, the text provider,
/// and the image dispatcher.
pub struct ChatService<R, P, IR, IS> {
    repository: R,
    provider: P,
    dispatcher: ImageDispatcher<IR, IS>,
    defaults: ProviderConfig,
}

impl<R, P, IR, IS> ChatService<R, P, IR, IS>
where
    R: ChatRepository,
    P: LlmProvider,
    IR: ImageRenderer,
    IS: ImageStore,
{
    pub fn new(
        repository: R,
        provider: P,
        dispatcher: ImageDispatcher<IR, IS>,
        defaults: ProviderConfig,
    ) -> Self {
        Self {
            repository,
            provider,
            dispatcher,
            defaults,
        }
    }

    /// Image operations exposed directly (direct generation, listing,
    /// cleanup, interrupt).
    pub fn images(&self) -> &ImageDispatcher<IR, IS> {
        &self.dispatcher
    }

    /// Resolve an existing session or create a fresh one.
    ///
    /// With an id: missing or soft-deleted sessions are `NotFound`, a
    /// session owned by another user is `Forbidden`. Without an id: a new
    /// Active session is created, carrying the model override if given.
    pub async fn create_or_resolve_session(
        &self,
        user_id: Uuid,
        session_id: Option<Uuid>,
        model_override: Option<String>,
    ) -> Result<ChatSession, ChatError> {
        match session_id {
            Some(id) => {
                let session = self
                    .repository
                    .get_session(&id)
                    .await?
                    .ok_or(ChatError::NotFound)?;
                if session.user_id != user_id {
                    return Err(ChatError::Forbidden);
                }
                if session.status == SessionStatus::Deleted {
                    return Err(ChatError::NotFound);
                }
                Ok(session)
            }
            None => {
                let now = Utc::now();
                let session = ChatSession {
                    id: Uuid::now_v7(),
                    user_id,
                    title: None,
                    status: SessionStatus::Active,
                    model: model_override,
                    temperature: None,
                    max_tokens: None,
                    created_at: now,
                    last_activity_at: now,
                };
                let created = self.repository.create_session(&session).await?;
                tracing::info!(session_id = %created.id, %user_id, "created chat session");
                Ok(created)
            }
        }
    }

    /// Process one exchange, blocking until the assistant turn is complete.
    #[tracing::instrument(skip(self, content), fields(%user_id))]
    pub async fn send_message(
        &self,
        user_id: Uuid,
        session_id: Option<Uuid>,
        content: &str,
        model_override: Option<String>,
    ) -> Result<ChatExchange, ChatError> {
        let (mut session, user_message) = self
            .begin_exchange(user_id, session_id, content, model_override.as_deref())
            .await?;

        let assistant_message = if is_image_generation_request(content) {
            self.run_image_turn(&session, content).await
        } else {
            let context = self.build_context(&session, model_override.as_deref()).await?;
            let model = context.options.model.clone();
            match self.provider.complete(&context).await {
                Ok(reply) => ChatMessage {
                    token_count: reply.token_count,
                    response_ms: Some(reply.elapsed_ms),
                    model: Some(reply.model),
                    ..assistant_message(&session, reply.content, MessageStatus::Delivered)
                },
                Err(e) => {
                    tracing::warn!(session_id = %session.id, error = %e, "completion failed");
                    ChatMessage {
                        model: Some(model),
                        error: Some(e.to_string()),
                        ..assistant_message(&session, String::new(), MessageStatus::Error)
                    }
                }
            }
        };

        self.finish_exchange(&mut session, &assistant_message).await?;
        Ok(ChatExchange {
            session,
            user_message,
            assistant_message,
        })
    }

    /// Process one exchange, invoking `on_token(delta, full_text_so_far)`
    /// for every text fragment in arrival order.
    ///
    /// Image-intent requests are atomic: the sink is never invoked and the
    /// result arrives whole. Everything else matches [`send_message`].
    #[tracing::instrument(skip(self, content, on_token), fields(%user_id))]
    pub async fn send_message_streaming<F>(
        &self,
        user_id: Uuid,
        session_id: Option<Uuid>,
        content: &str,
        model_override: Option<String>,
        on_token: F,
    ) -> Result<ChatExchange, ChatError>
    where
        F: FnMut(&str, &str),
    {
        let (mut session, user_message) = self
            .begin_exchange(user_id, session_id, content, model_override.as_deref())
            .await?;

        let assistant_message = if is_image_generation_request(content) {
            self.run_image_turn(&session, content).await
        } else {
            let context = self.build_context(&session, model_override.as_deref()).await?;
            let model = context.options.model.clone();
            match relay(&self.provider, context, on_token).await {
                Ok(reply) => ChatMessage {
                    token_count: reply.token_count,
                    response_ms: Some(reply.elapsed_ms),
                    model: Some(reply.model),
                    ..assistant_message(&session, reply.content, MessageStatus::Delivered)
                },
                Err(e) => {
                    tracing::warn!(
                        session_id = %session.id,
                        error = %e,
                        partial_len = e.partial.len(),
                        "streamed completion failed"
                    );
                    ChatMessage {
                        model: Some(model),
                        error: Some(e.source.to_string()),
                        ..assistant_message(&session, e.partial, MessageStatus::Error)
                    }
                }
            }
        };

        self.finish_exchange(&mut session, &assistant_message).await?;
        Ok(ChatExchange {
            session,
            user_message,
            assistant_message,
        })
    }

    /// List a user's sessions, most recent activity first.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.repository.list_sessions(&user_id, limit, offset).await?)
    }

    /// Fetch one session with ownership enforced.
    pub async fn get_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<ChatSession, ChatError> {
        self.create_or_resolve_session(user_id, Some(session_id), None)
            .await
    }

    /// Messages for a session, oldest first, with ownership enforced.
    pub async fn session_messages(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let session = self.get_session(user_id, session_id).await?;
        Ok(self.repository.get_messages(&session.id, limit, offset).await?)
    }

    /// Substring search over one session's messages.
    pub async fn search_messages(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        query: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let session = self.get_session(user_id, session_id).await?;
        Ok(self.repository.search_messages(&session.id, query).await?)
    }

    /// Archive a session. Idempotent for already-archived sessions.
    pub async fn archive_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<ChatSession, ChatError> {
        let mut session = self.get_session(user_id, session_id).await?;
        session.status = SessionStatus::Archived;
        self.repository.update_session(&session).await?;
        Ok(session)
    }

    /// Soft-delete a session. Deleted sessions vanish from listings and
    /// resolve as NotFound afterwards.
    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> Result<(), ChatError> {
        let mut session = self.get_session(user_id, session_id).await?;
        session.status = SessionStatus::Deleted;
        self.repository.update_session(&session).await?;
        tracing::info!(%session_id, "session soft-deleted");
        Ok(())
    }

    /// Validate, resolve the session, persist the user message, and derive
    /// a title for untitled sessions. The title lands in the database with
    /// the activity bump in [`finish_exchange`].
    async fn begin_exchange(
        &self,
        user_id: Uuid,
        session_id: Option<Uuid>,
        content: &str,
        model_override: Option<&str>,
    ) -> Result<(ChatSession, ChatMessage), ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation(
                "message content must not be empty".to_string(),
            ));
        }

        let mut session = self
            .create_or_resolve_session(user_id, session_id, model_override.map(String::from))
            .await?;

        let user_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: session.id,
            role: MessageRole::User,
            content: content.to_string(),
            status: MessageStatus::Sent,
            created_at: Utc::now(),
            model: None,
            token_count: None,
            response_ms: None,
            error: None,
            attachments: Vec::new(),
        };
        self.repository.save_message(&user_message).await?;

        if session.title.is_none() {
            session.title = Some(derive_title(content));
        }

        Ok((session, user_message))
    }

    /// Persist the assistant message and bump session activity (title
    /// included, if one was just derived).
    async fn finish_exchange(
        &self,
        session: &mut ChatSession,
        assistant_message: &ChatMessage,
    ) -> Result<(), ChatError> {
        self.repository.save_message(assistant_message).await?;
        session.last_activity_at = Utc::now();
        self.repository.update_session(session).await?;
        Ok(())
    }

    /// Replay the session history into a provider request.
    ///
    /// Messages with empty content (failed generations that produced
    /// nothing) are skipped; partial content from broken streams is kept.
    async fn build_context(
        &self,
        session: &ChatSession,
        model_override: Option<&str>,
    ) -> Result<ChatContext, ChatError> {
        let history = self.repository.get_messages(&session.id, None, None).await?;

        let messages = history
            .into_iter()
            .filter(|m| !m.content.is_empty())
            .map(|m| Message {
                role: m.role,
                content: m.content,
            })
            .collect();

        let model = model_override
            .map(String::from)
            .or_else(|| session.model.clone())
            .unwrap_or_else(|| self.defaults.model.clone());

        Ok(ChatContext {
            messages,
            options: CompletionOptions {
                model,
                temperature: Some(session.temperature.unwrap_or(self.defaults.temperature)),
                num_predict: Some(session.max_tokens.unwrap_or(self.defaults.num_predict)),
                ..Default::default()
            },
        })
    }

    /// Image-intent turn: extract the prompt, generate, attach.
    async fn run_image_turn(&self, session: &ChatSession, content: &str) -> ChatMessage {
        let prompt = extract_prompt(content);

        match self.dispatcher.generate(&ImageRequest::new(prompt)).await {
            Ok(image) => {
                let attachment = Attachment {
                    id: Uuid::now_v7(),
                    kind: AttachmentKind::Image,
                    url: image.url,
                    filename: image.filename,
                    prompt: Some(image.prompt),
                    metadata: image.info,
                };
                ChatMessage {
                    attachments: vec![attachment],
                    ..assistant_message(session, IMAGE_CAPTION.to_string(), MessageStatus::Delivered)
                }
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "image generation failed");
                ChatMessage {
                    error: Some(e.to_string()),
                    ..assistant_message(session, String::new(), MessageStatus::Error)
                }
            }
        }
    }
}

/// Base assistant message the paths specialize with struct update syntax.
fn assistant_message(session: &ChatSession, content: String, status: MessageStatus) -> ChatMessage {
    ChatMessage {
        id: Uuid::now_v7(),
        session_id: session.id,
        role: MessageRole::Assistant,
        content,
        status,
        created_at: Utc::now(),
        model: None,
        token_count: None,
        response_ms: None,
        error: None,
        attachments: Vec::new(),
    }
}
