use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::{EntriesQuery, SaveEntryRequest, SaveEntryResponse};
use crate::models::DiaryEntry;
use crate::startup::AppState;

/// Stores a diary entry with its emotion scores.
#[tracing::instrument(skip(state, request))]
pub async fn save_emotion_entry(
    State(state): State<AppState>,
    Json(request): Json<SaveEntryRequest>,
) -> Result<Json<SaveEntryResponse>, AppError> {
    let entry = request.into_entry()?;
    let diary_id = state.journal.record(&entry).await?;

    Ok(Json(SaveEntryResponse {
        diary_id,
        dominant_emotion: entry.dominant_emotion,
    }))
}

/// Entries of one day, each with its emotion scores.
#[tracing::instrument(skip(state))]
pub async fn get_emotion_entries(
    State(state): State<AppState>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<DiaryEntry>>, AppError> {
    let (user_id, diary_date) = query.into_parts()?;
    Ok(Json(state.journal.entries_on(user_id, diary_date).await?))
}
