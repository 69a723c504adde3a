//! Monthly emotion summaries built from the diary store.

use crate::models::{DailyEmotion, EmotionBucket, EmotionCount, ExtractionResult, MonthPeriod};
use crate::services::database::DiaryStore;
use crate::workers::KeywordAggregator;
use futures::future::try_join_all;
use service_core::error::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct EmotionInsights {
    store: Arc<dyn DiaryStore>,
    aggregator: KeywordAggregator,
    top_limit: i64,
}

impl EmotionInsights {
    pub fn new(store: Arc<dyn DiaryStore>, aggregator: KeywordAggregator, top_limit: i64) -> Self {
        Self {
            store,
            aggregator,
            top_limit,
        }
    }

    pub fn store(&self) -> &Arc<dyn DiaryStore> {
        &self.store
    }

    pub async fn top_emotions(
        &self,
        user_id: i64,
        period: MonthPeriod,
    ) -> Result<Vec<EmotionCount>, AppError> {
        self.store.top_emotions(user_id, period, self.top_limit).await
    }

    pub async fn emotion_colors(
        &self,
        user_id: i64,
        period: MonthPeriod,
    ) -> Result<Vec<DailyEmotion>, AppError> {
        self.store.emotion_colors(user_id, period).await
    }

    /// Top emotions of the month with keywords extracted from their diaries.
    ///
    /// A failed diary lookup for any emotion fails the whole request; a failed
    /// extraction only empties that emotion's words.
    #[tracing::instrument(skip(self), fields(year = period.year, month = period.month))]
    pub async fn monthly_keywords(
        &self,
        user_id: i64,
        period: MonthPeriod,
    ) -> Result<Vec<ExtractionResult>, AppError> {
        let top = self.top_emotions(user_id, period).await?;
        if top.is_empty() {
            return Ok(Vec::new());
        }

        let buckets = try_join_all(top.into_iter().map(|row| async move {
            let texts = self.store.diary_texts(user_id, period, &row.emotion).await?;
            Ok::<_, AppError>(EmotionBucket {
                emotion: row.emotion,
                count: row.count,
                source_text: texts.join(" "),
            })
        }))
        .await?;

        tracing::debug!(bucket_count = buckets.len(), "Built emotion buckets");

        Ok(self.aggregator.aggregate(buckets).await)
    }
}
