//! Diary entries and the per-emotion scores attached to them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Share of one emotion in a diary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: String,
    pub percent: f64,
}

/// Diary entry ready to be stored, with its dominant emotion resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiaryEntry {
    pub user_id: i64,
    pub diary_date: NaiveDate,
    pub diary: String,
    pub dominant_emotion: String,
    pub emotions: Vec<EmotionScore>,
}

impl NewDiaryEntry {
    /// Returns `None` when `emotions` is empty.
    ///
    /// The dominant emotion is the one with the highest percent; on a tie the
    /// earliest listed wins.
    pub fn new(
        user_id: i64,
        diary_date: NaiveDate,
        diary: String,
        emotions: Vec<EmotionScore>,
    ) -> Option<Self> {
        let dominant_emotion = emotions
            .iter()
            .reduce(|max, cur| if cur.percent > max.percent { cur } else { max })?
            .emotion
            .clone();

        Some(Self {
            user_id,
            diary_date,
            diary,
            dominant_emotion,
            emotions,
        })
    }
}

/// Stored diary entry together with its emotion scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryEntry {
    pub diary_id: i64,
    pub diary: String,
    pub dominant_emotion: String,
    pub created_at: DateTime<Utc>,
    pub emotions: Vec<EmotionScore>,
}
