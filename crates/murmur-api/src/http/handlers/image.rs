//! Direct image generation and artifact management endpoints.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::Instrument;

use murmur_observe::genai_attrs;
use murmur_types::image::{GeneratedImage, ImageRequest, StoredImage};

use crate::http::error::AppError;
use crate::http::extractors::UserId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub model: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f64>,
    pub sampler: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CleanupRequest {
    pub max_age_hours: Option<u64>,
}

/// Artifacts older than a day are eligible for cleanup by default.
const DEFAULT_MAX_AGE_HOURS: u64 = 24;

/// POST /api/v1/images — generate directly from a prompt.
pub async fn generate(
    State(state): State<AppState>,
    UserId(_user_id): UserId,
    Json(body): Json<GenerateImageRequest>,
) -> Result<ApiResponse<GeneratedImage>, AppError> {
    if body.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".to_string()));
    }

    let span = tracing::info_span!(
        "image_generation",
        { genai_attrs::GEN_AI_OPERATION_NAME } = genai_attrs::OP_GENERATE_IMAGE,
        { genai_attrs::GEN_AI_REQUEST_MODEL } = body.model.as_deref().unwrap_or(""),
    );

    let request = ImageRequest {
        prompt: body.prompt,
        negative_prompt: body.negative_prompt,
        model: body.model,
        width: body.width,
        height: body.height,
        steps: body.steps,
        cfg_scale: body.cfg_scale,
        sampler: body.sampler,
    };

    let image = state
        .chat_service
        .images()
        .generate(&request)
        .instrument(span)
        .await?;
    Ok(ApiResponse::success(image))
}

/// GET /api/v1/images — saved artifacts, newest first.
pub async fn list(
    State(state): State<AppState>,
    UserId(_user_id): UserId,
) -> Result<ApiResponse<Vec<StoredImage>>, AppError> {
    let images = state.chat_service.images().list_saved_images().await?;
    Ok(ApiResponse::success(images))
}

/// POST /api/v1/images/cleanup — delete artifacts past the age cutoff.
pub async fn cleanup(
    State(state): State<AppState>,
    UserId(_user_id): UserId,
    body: Option<Json<CleanupRequest>>,
) -> Result<ApiResponse<Value>, AppError> {
    let max_age_hours = body
        .and_then(|Json(b)| b.max_age_hours)
        .unwrap_or(DEFAULT_MAX_AGE_HOURS);
    let deleted = state
        .chat_service
        .images()
        .cleanup_old_images(max_age_hours)
        .await?;
    Ok(ApiResponse::success(json!({ "deleted": deleted })))
}

/// POST /api/v1/images/interrupt — best-effort cancellation.
pub async fn interrupt(
    State(state): State<AppState>,
    UserId(_user_id): UserId,
) -> Result<ApiResponse<Value>, AppError> {
    let interrupted = state.chat_service.images().interrupt_generation().await;
    Ok(ApiResponse::success(json!({ "interrupted": interrupted })))
}

/// GET /api/v1/images/system — renderer memory diagnostics passthrough.
pub async fn system_info(
    State(state): State<AppState>,
    UserId(_user_id): UserId,
) -> Result<ApiResponse<Value>, AppError> {
    let info = state.chat_service.images().system_info().await?;
    Ok(ApiResponse::success(info))
}
