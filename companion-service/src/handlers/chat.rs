use axum::{extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{ChatRequest, ChatResponse};
use crate::startup::AppState;

/// Runs one counseling turn for the caller's session.
#[tracing::instrument(skip(state, request), fields(session_id = %request.session_id()))]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request.validate()?;

    let message = request.message.as_deref().unwrap_or_default();
    let reply = state
        .dispatcher
        .dispatch(request.session_id(), message)
        .await
        .map_err(|e| AppError::BadGateway(format!("Chat model request failed: {}", e)))?;

    Ok(Json(ChatResponse { reply }))
}
