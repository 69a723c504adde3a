use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::MonthlyQuery;
use crate::models::{DailyEmotion, EmotionCount, ExtractionResult};
use crate::startup::AppState;

/// Top emotions of the month, each with keywords from its diaries.
#[tracing::instrument(skip(state))]
pub async fn monthly_top_emotions_with_words(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<ExtractionResult>>, AppError> {
    let (user_id, period) = query.into_parts()?;
    let results = state.insights.monthly_keywords(user_id, period).await?;

    tracing::info!(
        user_id,
        result_count = results.len(),
        "Monthly keywords computed"
    );

    Ok(Json(results))
}

#[tracing::instrument(skip(state))]
pub async fn monthly_top_emotions(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<EmotionCount>>, AppError> {
    let (user_id, period) = query.into_parts()?;
    Ok(Json(state.insights.top_emotions(user_id, period).await?))
}

#[tracing::instrument(skip(state))]
pub async fn monthly_emotion_colors(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<DailyEmotion>>, AppError> {
    let (user_id, period) = query.into_parts()?;
    Ok(Json(state.insights.emotion_colors(user_id, period).await?))
}
