use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use super::trimmed;
use crate::models::{EmotionScore, NewDiaryEntry};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EmotionScoreInput {
    #[validate(length(min = 1, message = "emotion cannot be empty"))]
    pub emotion: String,
    #[validate(range(min = 0.0, message = "percent cannot be negative"))]
    pub percent: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveEntryRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i64>,
    /// `YYYY-MM-DD`.
    #[validate(required(message = "diary_date is required"))]
    pub diary_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "diary is required"),
        length(min = 1, message = "diary cannot be empty")
    )]
    pub diary: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "emotions must not be empty"), nested)]
    pub emotions: Vec<EmotionScoreInput>,
}

impl SaveEntryRequest {
    /// Validates the request and resolves its dominant emotion.
    pub fn into_entry(self) -> Result<NewDiaryEntry, AppError> {
        self.validate()?;

        let (Some(user_id), Some(diary_date), Some(diary)) = (self.user_id, self.diary_date, self.diary)
        else {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "user_id, diary_date and diary are required"
            )));
        };

        let emotions = self
            .emotions
            .into_iter()
            .map(|input| EmotionScore {
                emotion: input.emotion,
                percent: input.percent,
            })
            .collect();

        NewDiaryEntry::new(user_id, diary_date, diary, emotions)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("emotions must not be empty")))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveEntryResponse {
    pub diary_id: i64,
    pub dominant_emotion: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EntriesQuery {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<i64>,
    #[validate(required(message = "diary_date is required"))]
    pub diary_date: Option<NaiveDate>,
}

impl EntriesQuery {
    pub fn into_parts(self) -> Result<(i64, NaiveDate), AppError> {
        self.validate()?;

        let (Some(user_id), Some(diary_date)) = (self.user_id, self.diary_date) else {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "user_id and diary_date are required"
            )));
        };

        Ok((user_id, diary_date))
    }
}
