//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `murmur-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reader pool for
//! SELECTs and the single-writer pool for mutations. A message and its
//! attachments are written in one transaction so a partially attached
//! message can never be observed.

use murmur_core::chat::repository::ChatRepository;
use murmur_types::chat::{Attachment, AttachmentKind, ChatMessage, ChatSession, SessionStatus};
use murmur_types::chat::{MessageRole, MessageStatus};
use murmur_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn attachments_for(&self, message_id: &Uuid) -> Result<Vec<Attachment>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM message_attachments WHERE message_id = ? ORDER BY position ASC",
        )
        .bind(message_id.to_string())
        .fetch_all(self.pool.reader())
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut attachments = Vec::with_capacity(rows.len());
        for row in &rows {
            let attachment_row =
                AttachmentRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            attachments.push(attachment_row.into_attachment()?);
        }
        Ok(attachments)
    }

    async fn hydrate(&self, row: ChatMessageRow) -> Result<ChatMessage, RepositoryError> {
        let mut message = row.into_message()?;
        message.attachments = self.attachments_for(&message.id).await?;
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    user_id: String,
    title: Option<String>,
    status: String,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<i64>,
    created_at: String,
    last_activity_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            status: row.try_get("status")?,
            model: row.try_get("model")?,
            temperature: row.try_get("temperature")?,
            max_tokens: row.try_get("max_tokens")?,
            created_at: row.try_get("created_at")?,
            last_activity_at: row.try_get("last_activity_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let status: SessionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatSession {
            id,
            user_id,
            title: self.title,
            status,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens.map(|v| v as u32),
            created_at: parse_datetime(&self.created_at)?,
            last_activity_at: parse_datetime(&self.last_activity_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    status: String,
    created_at: String,
    model: Option<String>,
    token_count: Option<i64>,
    response_ms: Option<i64>,
    error: Option<String>,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            model: row.try_get("model")?,
            token_count: row.try_get("token_count")?,
            response_ms: row.try_get("response_ms")?,
            error: row.try_get("error")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let status: MessageStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            session_id,
            role,
            content: self.content,
            status,
            created_at: parse_datetime(&self.created_at)?,
            model: self.model,
            token_count: self.token_count.map(|v| v as u32),
            response_ms: self.response_ms.map(|v| v as u64),
            error: self.error,
            attachments: Vec::new(),
        })
    }
}

/// Internal row type for mapping SQLite rows to domain Attachment.
struct AttachmentRow {
    id: String,
    kind: String,
    url: String,
    filename: String,
    prompt: Option<String>,
    metadata: Option<String>,
}

impl AttachmentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            url: row.try_get("url")?,
            filename: row.try_get("filename")?,
            prompt: row.try_get("prompt")?,
            metadata: row.try_get("metadata")?,
        })
    }

    fn into_attachment(self) -> Result<Attachment, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid attachment id: {e}")))?;
        let kind: AttachmentKind = self
            .kind
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let metadata = self
            .metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid attachment metadata: {e}")))?;

        Ok(Attachment {
            id,
            kind,
            url: self.url,
            filename: self.filename,
            prompt: self.prompt,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, title, status, model, temperature, max_tokens, created_at, last_activity_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.title)
        .bind(session.status.to_string())
        .bind(&session.model)
        .bind(session.temperature)
        .bind(session.max_tokens.map(|v| v as i64))
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.last_activity_at))
        .execute(self.pool.writer())
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(self.pool.reader())
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn update_session(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE chat_sessions
               SET title = ?, status = ?, model = ?, temperature = ?, max_tokens = ?, last_activity_at = ?
               WHERE id = ?"#,
        )
        .bind(&session.title)
        .bind(session.status.to_string())
        .bind(&session.model)
        .bind(session.temperature)
        .bind(session.max_tokens.map(|v| v as i64))
        .bind(format_datetime(&session.last_activity_at))
        .bind(session.id.to_string())
        .execute(self.pool.writer())
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_sessions(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        // LIMIT -1 is SQLite for "no limit"; client-supplied negatives clamp
        // to zero rows instead of silently meaning unlimited.
        let limit = limit.map_or(-1, |l| l.max(0));
        let offset = offset.map_or(0, |o| o.max(0));

        let rows = sqlx::query(
            r#"SELECT * FROM chat_sessions
               WHERE user_id = ? AND status != 'deleted'
               ORDER BY last_activity_at DESC
               LIMIT ? OFFSET ?"#,
        )
            .bind(user_id.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.reader())
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row =
                ChatSessionRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        // Message and attachments land in one transaction.
        let mut tx = self
            .pool
            .writer()
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO chat_messages (id, session_id, role, content, status, created_at, model, token_count, response_ms, error)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.session_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(message.status.to_string())
        .bind(format_datetime(&message.created_at))
        .bind(&message.model)
        .bind(message.token_count.map(|v| v as i64))
        .bind(message.response_ms.map(|v| v as i64))
        .bind(&message.error)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for (position, attachment) in message.attachments.iter().enumerate() {
            let metadata = attachment
                .metadata
                .as_ref()
                .map(|m| m.to_string());
            sqlx::query(
                r#"INSERT INTO message_attachments (id, message_id, position, kind, url, filename, prompt, metadata)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(attachment.id.to_string())
            .bind(message.id.to_string())
            .bind(position as i64)
            .bind(attachment.kind.to_string())
            .bind(&attachment.url)
            .bind(&attachment.filename)
            .bind(&attachment.prompt)
            .bind(metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn update_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE chat_messages
               SET content = ?, status = ?, model = ?, token_count = ?, response_ms = ?, error = ?
               WHERE id = ?"#,
        )
        .bind(&message.content)
        .bind(message.status.to_string())
        .bind(&message.model)
        .bind(message.token_count.map(|v| v as i64))
        .bind(message.response_ms.map(|v| v as i64))
        .bind(&message.error)
        .bind(message.id.to_string())
        .execute(self.pool.writer())
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_message(&self, message_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_messages WHERE id = ?")
            .bind(message_id.to_string())
            .fetch_optional(self.pool.reader())
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let msg_row = ChatMessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(self.hydrate(msg_row).await?))
            }
            None => Ok(None),
        }
    }

    async fn get_messages(
        &self,
        session_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let limit = limit.map_or(-1, |l| l.max(0));
        let offset = offset.map_or(0, |o| o.max(0));

        let rows = sqlx::query(
            r#"SELECT * FROM chat_messages
               WHERE session_id = ?
               ORDER BY created_at ASC
               LIMIT ? OFFSET ?"#,
        )
            .bind(session_id.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.reader())
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(self.hydrate(msg_row).await?);
        }

        Ok(messages)
    }

    async fn recent_messages(
        &self,
        user_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT m.* FROM chat_messages m
               JOIN chat_sessions s ON s.id = m.session_id
               WHERE s.user_id = ? AND s.status != 'deleted'
               ORDER BY m.created_at DESC
               LIMIT ?"#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(self.pool.reader())
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(self.hydrate(msg_row).await?);
        }

        Ok(messages)
    }

    async fn search_messages(
        &self,
        session_id: &Uuid,
        query: &str,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("%{escaped}%");

        let rows = sqlx::query(
            r#"SELECT * FROM chat_messages
               WHERE session_id = ? AND content LIKE ? ESCAPE '\'
               ORDER BY created_at ASC"#,
        )
        .bind(session_id.to_string())
        .bind(pattern)
        .fetch_all(self.pool.reader())
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(self.hydrate(msg_row).await?);
        }

        Ok(messages)
    }

    async fn count_sessions(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM chat_sessions WHERE status != 'deleted'")
            .fetch_one(self.pool.reader())
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM chat_messages")
            .fetch_one(self.pool.reader())
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::open(&db_path).await.unwrap()
    }

    fn make_session(user_id: Uuid) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id: Uuid::now_v7(),
            user_id,
            title: None,
            status: SessionStatus::Active,
            model: Some("llama3.2".to_string()),
            temperature: None,
            max_tokens: None,
            created_at: now,
            last_activity_at: now,
        }
    }

    fn make_message(session_id: Uuid, role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role,
            content: content.to_string(),
            status: MessageStatus::Sent,
            created_at: Utc::now(),
            model: None,
            token_count: None,
            response_ms: None,
            error: None,
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let user_id = Uuid::now_v7();
        let session = make_session(user_id);
        let created = repo.create_session(&session).await.unwrap();
        assert_eq!(created.id, session.id);
        assert_eq!(created.status, SessionStatus::Active);

        let found = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.model.as_deref(), Some("llama3.2"));
        assert!(found.title.is_none());
    }

    #[tokio::test]
    async fn test_update_session_title_and_status() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let mut session = make_session(Uuid::now_v7());
        repo.create_session(&session).await.unwrap();

        session.title = Some("Trip planning".to_string());
        session.status = SessionStatus::Archived;
        session.temperature = Some(0.2);
        session.last_activity_at = Utc::now();
        repo.update_session(&session).await.unwrap();

        let found = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some("Trip planning"));
        assert_eq!(found.status, SessionStatus::Archived);
        assert_eq!(found.temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_update_missing_session_is_not_found() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(Uuid::now_v7());
        let err = repo.update_session(&session).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_list_sessions_excludes_soft_deleted() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let user_id = Uuid::now_v7();
        let keep = make_session(user_id);
        repo.create_session(&keep).await.unwrap();

        let mut gone = make_session(user_id);
        repo.create_session(&gone).await.unwrap();
        gone.status = SessionStatus::Deleted;
        repo.update_session(&gone).await.unwrap();

        let listed = repo.list_sessions(&user_id, None, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);

        // The row still exists; only listings hide it.
        assert!(repo.get_session(&gone.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_sessions_pagination_and_ordering() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let user_id = Uuid::now_v7();
        let mut ids = Vec::new();
        for i in 0..3 {
            let mut session = make_session(user_id);
            session.last_activity_at = Utc::now() + chrono::Duration::seconds(i);
            repo.create_session(&session).await.unwrap();
            ids.push(session.id);
        }

        let all = repo.list_sessions(&user_id, None, None).await.unwrap();
        assert_eq!(all.len(), 3);
        // Most recent activity first.
        assert_eq!(all[0].id, ids[2]);

        let page = repo.list_sessions(&user_id, Some(2), Some(1)).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[1]);

        // Offset works without an explicit limit.
        let rest = repo.list_sessions(&user_id, None, Some(2)).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_negative_pagination_values_clamp_to_zero() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let user_id = Uuid::now_v7();
        let session = make_session(user_id);
        repo.create_session(&session).await.unwrap();
        repo.save_message(&make_message(session.id, MessageRole::User, "hello"))
            .await
            .unwrap();

        // A negative limit must not turn into "unlimited".
        let sessions = repo.list_sessions(&user_id, Some(-5), None).await.unwrap();
        assert!(sessions.is_empty());
        let messages = repo.get_messages(&session.id, Some(-1), None).await.unwrap();
        assert!(messages.is_empty());

        // A negative offset reads from the start.
        let all = repo.get_messages(&session.id, None, Some(-3)).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_save_and_get_messages_ordered() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(Uuid::now_v7());
        repo.create_session(&session).await.unwrap();

        let msg1 = make_message(session.id, MessageRole::User, "Hello");
        let msg2 = ChatMessage {
            status: MessageStatus::Delivered,
            model: Some("llama3.2".to_string()),
            token_count: Some(12),
            response_ms: Some(900),
            created_at: Utc::now() + chrono::Duration::seconds(1),
            ..make_message(session.id, MessageRole::Assistant, "Hi there!")
        };

        repo.save_message(&msg1).await.unwrap();
        repo.save_message(&msg2).await.unwrap();

        let messages = repo.get_messages(&session.id, None, None).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].token_count, Some(12));
        assert_eq!(messages[1].response_ms, Some(900));
        assert_eq!(messages[1].status, MessageStatus::Delivered);

        assert_eq!(repo.count_messages().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_message_attachments_roundtrip_in_order() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(Uuid::now_v7());
        repo.create_session(&session).await.unwrap();

        let attachments = vec![
            Attachment {
                id: Uuid::now_v7(),
                kind: AttachmentKind::Image,
                url: "/images/first.png".to_string(),
                filename: "first.png".to_string(),
                prompt: Some("a fox".to_string()),
                metadata: Some(serde_json::json!({"seed": 1})),
            },
            Attachment {
                id: Uuid::now_v7(),
                kind: AttachmentKind::Image,
                url: "/images/second.png".to_string(),
                filename: "second.png".to_string(),
                prompt: None,
                metadata: None,
            },
        ];
        let message = ChatMessage {
            attachments: attachments.clone(),
            status: MessageStatus::Delivered,
            ..make_message(session.id, MessageRole::Assistant, "Here you go")
        };
        repo.save_message(&message).await.unwrap();

        let found = repo.get_message(&message.id).await.unwrap().unwrap();
        assert_eq!(found.attachments.len(), 2);
        assert_eq!(found.attachments[0].url, "/images/first.png");
        assert_eq!(found.attachments[0].metadata, Some(serde_json::json!({"seed": 1})));
        assert_eq!(found.attachments[1].url, "/images/second.png");
        assert!(found.attachments[1].prompt.is_none());
    }

    #[tokio::test]
    async fn test_update_message_error_capture() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(Uuid::now_v7());
        repo.create_session(&session).await.unwrap();

        let mut message = make_message(session.id, MessageRole::Assistant, "");
        repo.save_message(&message).await.unwrap();

        message.content = "partial answ".to_string();
        message.status = MessageStatus::Error;
        message.error = Some("transport error: connection reset".to_string());
        repo.update_message(&message).await.unwrap();

        let found = repo.get_message(&message.id).await.unwrap().unwrap();
        assert_eq!(found.status, MessageStatus::Error);
        assert_eq!(found.content, "partial answ");
        assert!(found.error.as_deref().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_search_messages_substring() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(Uuid::now_v7());
        repo.create_session(&session).await.unwrap();

        repo.save_message(&make_message(session.id, MessageRole::User, "Tell me about Rust"))
            .await
            .unwrap();
        repo.save_message(&make_message(session.id, MessageRole::Assistant, "Rust is a systems language"))
            .await
            .unwrap();
        repo.save_message(&make_message(session.id, MessageRole::User, "What about Go?"))
            .await
            .unwrap();

        let hits = repo.search_messages(&session.id, "Rust").await.unwrap();
        assert_eq!(hits.len(), 2);

        // LIKE wildcards in the query are treated literally.
        let none = repo.search_messages(&session.id, "%").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_recent_messages_across_sessions() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let user_id = Uuid::now_v7();
        let s1 = make_session(user_id);
        let s2 = make_session(user_id);
        repo.create_session(&s1).await.unwrap();
        repo.create_session(&s2).await.unwrap();

        for i in 0..3 {
            let message = ChatMessage {
                created_at: Utc::now() + chrono::Duration::seconds(i),
                ..make_message(if i % 2 == 0 { s1.id } else { s2.id }, MessageRole::User, "ping")
            };
            repo.save_message(&message).await.unwrap();
        }

        let recent = repo.recent_messages(&user_id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].created_at >= recent[1].created_at);
    }

    #[tokio::test]
    async fn test_count_sessions_skips_deleted() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let user_id = Uuid::now_v7();
        let keep = make_session(user_id);
        repo.create_session(&keep).await.unwrap();
        let mut gone = make_session(user_id);
        repo.create_session(&gone).await.unwrap();
        gone.status = SessionStatus::Deleted;
        repo.update_session(&gone).await.unwrap();

        assert_eq!(repo.count_sessions().await.unwrap(), 1);
    }
}
