//! Session management endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use murmur_types::chat::{ChatMessage, ChatSession};

use crate::http::error::AppError;
use crate::http::extractors::UserId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/v1/sessions — list the caller's sessions, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<Vec<ChatSession>>, AppError> {
    let sessions = state
        .chat_service
        .list_sessions(user_id, page.limit, page.offset)
        .await?;
    Ok(ApiResponse::success(sessions))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<Uuid>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let session = state.chat_service.get_session(user_id, session_id).await?;
    Ok(ApiResponse::success(session))
}

/// GET /api/v1/sessions/{id}/messages — oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let messages = state
        .chat_service
        .session_messages(user_id, session_id, page.limit, page.offset)
        .await?;
    Ok(ApiResponse::success(messages))
}

/// GET /api/v1/sessions/{id}/messages/search?q=
pub async fn search_messages(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<Uuid>,
    Query(search): Query<SearchQuery>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    if search.q.trim().is_empty() {
        return Err(AppError::Validation("search query must not be empty".to_string()));
    }
    let messages = state
        .chat_service
        .search_messages(user_id, session_id, &search.q)
        .await?;
    Ok(ApiResponse::success(messages))
}

/// POST /api/v1/sessions/{id}/archive
pub async fn archive_session(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<Uuid>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let session = state
        .chat_service
        .archive_session(user_id, session_id)
        .await?;
    Ok(ApiResponse::success(session))
}

/// DELETE /api/v1/sessions/{id} — soft delete.
pub async fn delete_session(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<Uuid>,
) -> Result<ApiResponse<Value>, AppError> {
    state.chat_service.delete_session(user_id, session_id).await?;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
