//! Writing and reading individual diary entries.

use crate::models::{DiaryEntry, NewDiaryEntry};
use crate::services::database::DiaryStore;
use chrono::NaiveDate;
use service_core::error::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct EmotionJournal {
    store: Arc<dyn DiaryStore>,
}

impl EmotionJournal {
    pub fn new(store: Arc<dyn DiaryStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, entry), fields(user_id = entry.user_id, dominant = %entry.dominant_emotion))]
    pub async fn record(&self, entry: &NewDiaryEntry) -> Result<i64, AppError> {
        let diary_id = self.store.save_entry(entry).await?;
        tracing::info!(
            diary_id,
            score_count = entry.emotions.len(),
            "Recorded diary entry"
        );
        Ok(diary_id)
    }

    pub async fn entries_on(
        &self,
        user_id: i64,
        diary_date: NaiveDate,
    ) -> Result<Vec<DiaryEntry>, AppError> {
        self.store.entries_on(user_id, diary_date).await
    }
}
