//! HTTP API routes for the relay.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

pub mod websocket;

use crate::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws/search", get(websocket::search_websocket))
        .route("/channel/{channel_id}", get(channel_profile))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Fetch a channel's combined profile (metadata plus recent videos)
/// through the supervisor.
async fn channel_profile(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> impl IntoResponse {
    match state.fetch_channel_profile(channel_id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "channel profile fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e})),
            )
                .into_response()
        }
    }
}
