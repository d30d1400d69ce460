//! API route definitions.

use axum::Router;
use axum::routing::{delete, get, post};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers::{chat, image, session};
use crate::state::AppState;

/// Build the complete application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/chat", post(chat::send_message))
        .route("/chat/stream", post(chat::send_message_streaming))
        .route("/sessions", get(session::list_sessions))
        .route("/sessions/{id}", get(session::get_session))
        .route("/sessions/{id}", delete(session::delete_session))
        .route("/sessions/{id}/messages", get(session::get_messages))
        .route(
            "/sessions/{id}/messages/search",
            get(session::search_messages),
        )
        .route("/sessions/{id}/archive", post(session::archive_session))
        .route("/images", post(image::generate))
        .route("/images", get(image::list))
        .route("/images/cleanup", post(image::cleanup))
        .route("/images/interrupt", post(image::interrupt))
        .route("/images/system", get(image::system_info));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .nest_service("/images", ServeDir::new(state.images_dir.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// GET /health — liveness check.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
