//! Emotion diary queries backing the monthly aggregation endpoints.

use crate::models::{DailyEmotion, DiaryEntry, EmotionCount, EmotionScore, MonthPeriod, NewDiaryEntry};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{info, instrument};

/// Stored diary entries and their emotion scores.
#[async_trait]
pub trait DiaryStore: Send + Sync {
    /// Stores the entry and its emotion scores, returning the new diary id.
    async fn save_entry(&self, entry: &NewDiaryEntry) -> Result<i64, AppError>;

    /// Entries written on `diary_date`, oldest first, each with its scores.
    async fn entries_on(
        &self,
        user_id: i64,
        diary_date: NaiveDate,
    ) -> Result<Vec<DiaryEntry>, AppError>;

    /// Dominant emotions for the month, most frequent first, at most `limit`.
    async fn top_emotions(
        &self,
        user_id: i64,
        period: MonthPeriod,
        limit: i64,
    ) -> Result<Vec<EmotionCount>, AppError>;

    /// Diary texts of the month whose dominant emotion is `emotion`.
    async fn diary_texts(
        &self,
        user_id: i64,
        period: MonthPeriod,
        emotion: &str,
    ) -> Result<Vec<String>, AppError>;

    /// Dominant emotion of every diary entry in the month, by date.
    async fn emotion_colors(
        &self,
        user_id: i64,
        period: MonthPeriod,
    ) -> Result<Vec<DailyEmotion>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Postgres-backed diary store.
#[derive(Clone)]
pub struct PgDiaryStore {
    pool: PgPool,
}

impl PgDiaryStore {
    #[instrument(skip(database_url), fields(service = "companion-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// One row of the diary/details join; detail columns are null for an entry
/// without scores.
#[derive(Debug, sqlx::FromRow)]
struct EntryDetailRow {
    diary_id: i64,
    diary: String,
    dominant_emotion: String,
    created_at: DateTime<Utc>,
    emotion: Option<String>,
    percent: Option<f64>,
}

/// Folds join rows, ordered by diary id, into one entry per diary.
fn group_entry_rows(rows: Vec<EntryDetailRow>) -> Vec<DiaryEntry> {
    let mut entries: Vec<DiaryEntry> = Vec::new();

    for row in rows {
        if entries.last().map(|e| e.diary_id) != Some(row.diary_id) {
            entries.push(DiaryEntry {
                diary_id: row.diary_id,
                diary: row.diary,
                dominant_emotion: row.dominant_emotion,
                created_at: row.created_at,
                emotions: Vec::new(),
            });
        }

        if let (Some(emotion), Some(percent), Some(entry)) =
            (row.emotion, row.percent, entries.last_mut())
        {
            entry.emotions.push(EmotionScore { emotion, percent });
        }
    }

    entries
}

#[async_trait]
impl DiaryStore for PgDiaryStore {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, diary_date = %entry.diary_date))]
    async fn save_entry(&self, entry: &NewDiaryEntry) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["save_entry"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e)))?;

        let diary_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO emotion_diary (user_id, diary_date, diary, dominant_emotion, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.diary_date)
        .bind(&entry.diary)
        .bind(&entry.dominant_emotion)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert diary: {}", e)))?;

        let mut details =
            QueryBuilder::<Postgres>::new("INSERT INTO emotion_details (diary_id, emotion, percent) ");
        details.push_values(&entry.emotions, |mut row, score| {
            row.push_bind(diary_id)
                .push_bind(score.emotion.clone())
                .push_bind(score.percent);
        });
        details
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert emotion details: {}", e))
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit diary: {}", e)))?;

        timer.observe_duration();
        info!(diary_id, dominant_emotion = %entry.dominant_emotion, "Diary entry saved");
        Ok(diary_id)
    }

    #[instrument(skip(self), fields(user_id = %user_id, diary_date = %diary_date))]
    async fn entries_on(
        &self,
        user_id: i64,
        diary_date: NaiveDate,
    ) -> Result<Vec<DiaryEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["entries_on"])
            .start_timer();

        let rows = sqlx::query_as::<_, EntryDetailRow>(
            r#"
            SELECT ed.id AS diary_id, ed.diary, ed.dominant_emotion, ed.created_at,
                   dt.emotion, dt.percent
            FROM emotion_diary ed
            LEFT JOIN emotion_details dt ON ed.id = dt.diary_id
            WHERE ed.user_id = $1 AND ed.diary_date = $2
            ORDER BY ed.id ASC, dt.id ASC
            "#,
        )
        .bind(user_id)
        .bind(diary_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to query diary entries: {}", e)))?;

        timer.observe_duration();
        Ok(group_entry_rows(rows))
    }

    #[instrument(skip(self), fields(user_id = %user_id, year = period.year, month = period.month))]
    async fn top_emotions(
        &self,
        user_id: i64,
        period: MonthPeriod,
        limit: i64,
    ) -> Result<Vec<EmotionCount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["top_emotions"])
            .start_timer();
        let (start, end) = period.date_range();

        let rows = sqlx::query_as::<_, EmotionCount>(
            r#"
            SELECT dominant_emotion AS emotion, COUNT(*) AS count
            FROM emotion_diary
            WHERE user_id = $1 AND diary_date >= $2 AND diary_date < $3
            GROUP BY dominant_emotion
            ORDER BY count DESC, dominant_emotion ASC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to query top emotions: {}", e)))?;

        timer.observe_duration();
        Ok(rows)
    }

    #[instrument(skip(self), fields(user_id = %user_id, emotion = %emotion))]
    async fn diary_texts(
        &self,
        user_id: i64,
        period: MonthPeriod,
        emotion: &str,
    ) -> Result<Vec<String>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["diary_texts"])
            .start_timer();
        let (start, end) = period.date_range();

        let texts = sqlx::query_scalar::<_, String>(
            r#"
            SELECT diary
            FROM emotion_diary
            WHERE user_id = $1 AND diary_date >= $2 AND diary_date < $3 AND dominant_emotion = $4
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(emotion)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to query diaries: {}", e)))?;

        timer.observe_duration();
        Ok(texts)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn emotion_colors(
        &self,
        user_id: i64,
        period: MonthPeriod,
    ) -> Result<Vec<DailyEmotion>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["emotion_colors"])
            .start_timer();
        let (start, end) = period.date_range();

        let rows = sqlx::query_as::<_, DailyEmotion>(
            r#"
            SELECT TO_CHAR(diary_date, 'YYYY-MM-DD') AS diary_date, dominant_emotion AS emotion
            FROM emotion_diary
            WHERE user_id = $1 AND diary_date >= $2 AND diary_date < $3
            ORDER BY diary_date ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to query emotion colors: {}", e))
        })?;

        timer.observe_duration();
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
