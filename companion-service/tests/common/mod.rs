//! Common test utilities for companion-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use companion_service::models::{
    ConversationTurn, DailyEmotion, DiaryEntry, EmotionCount, EmotionScore, MonthPeriod,
    NewDiaryEntry,
};
use companion_service::services::providers::{ChatProvider, ProviderError};
use companion_service::services::{
    init_metrics, ConversationTurnDispatcher, DiaryStore, EmotionInsights, EmotionJournal,
    SessionContextStore, StopwordFilter,
};
use companion_service::startup::{build_router, AppState};
use companion_service::workers::{KeywordAggregator, ProcessKeywordExtractor, WorkerExecutor};
use service_core::error::AppError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tower::util::ServiceExt;

static INIT: Once = Once::new();

pub const SYSTEM_PROMPT: &str = "test persona";

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,companion_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Debug, Clone)]
struct DiaryRow {
    id: i64,
    user_id: i64,
    date: NaiveDate,
    text: String,
    emotion: String,
    scores: Vec<EmotionScore>,
}

/// In-memory diary table with switchable failures.
#[derive(Default)]
pub struct InMemoryDiaryStore {
    rows: Mutex<Vec<DiaryRow>>,
    pub fail_text_lookup: Mutex<Option<String>>,
    pub unavailable: Mutex<bool>,
}

impl InMemoryDiaryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, user_id: i64, date: &str, text: &str, emotion: &str) {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(DiaryRow {
            id,
            user_id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            text: text.to_string(),
            emotion: emotion.to_string(),
            scores: Vec::new(),
        });
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn month_rows(&self, user_id: i64, period: MonthPeriod) -> Vec<DiaryRow> {
        let (start, end) = period.date_range();
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.date >= start && r.date < end)
            .cloned()
            .collect()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if *self.unavailable.lock().unwrap() {
            return Err(AppError::DatabaseError(anyhow::anyhow!("store offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl DiaryStore for InMemoryDiaryStore {
    async fn save_entry(&self, entry: &NewDiaryEntry) -> Result<i64, AppError> {
        self.check_available()?;
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(DiaryRow {
            id,
            user_id: entry.user_id,
            date: entry.diary_date,
            text: entry.diary.clone(),
            emotion: entry.dominant_emotion.clone(),
            scores: entry.emotions.clone(),
        });
        Ok(id)
    }

    async fn entries_on(
        &self,
        user_id: i64,
        diary_date: NaiveDate,
    ) -> Result<Vec<DiaryEntry>, AppError> {
        self.check_available()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.date == diary_date)
            .map(|r| DiaryEntry {
                diary_id: r.id,
                diary: r.text.clone(),
                dominant_emotion: r.emotion.clone(),
                created_at: Utc::now(),
                emotions: r.scores.clone(),
            })
            .collect())
    }

    async fn top_emotions(
        &self,
        user_id: i64,
        period: MonthPeriod,
        limit: i64,
    ) -> Result<Vec<EmotionCount>, AppError> {
        self.check_available()?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for row in self.month_rows(user_id, period) {
            *counts.entry(row.emotion).or_default() += 1;
        }
        let mut rows: Vec<_> = counts
            .into_iter()
            .map(|(emotion, count)| EmotionCount { emotion, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.emotion.cmp(&b.emotion)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn diary_texts(
        &self,
        user_id: i64,
        period: MonthPeriod,
        emotion: &str,
    ) -> Result<Vec<String>, AppError> {
        self.check_available()?;
        if self.fail_text_lookup.lock().unwrap().as_deref() == Some(emotion) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "lookup failed for {}",
                emotion
            )));
        }
        Ok(self
            .month_rows(user_id, period)
            .into_iter()
            .filter(|r| r.emotion == emotion)
            .map(|r| r.text)
            .collect())
    }

    async fn emotion_colors(
        &self,
        user_id: i64,
        period: MonthPeriod,
    ) -> Result<Vec<DailyEmotion>, AppError> {
        self.check_available()?;
        let mut rows = self.month_rows(user_id, period);
        rows.sort_by_key(|r| (r.date, r.id));
        Ok(rows
            .into_iter()
            .map(|r| DailyEmotion {
                diary_date: r.date.format("%Y-%m-%d").to_string(),
                emotion: r.emotion,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check_available()
    }
}

/// Chat provider that replays scripted replies and records each context.
#[derive(Default)]
pub struct ScriptedChatProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    pub seen: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl ScriptedChatProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatProvider for ScriptedChatProvider {
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String, ProviderError> {
        self.seen.lock().unwrap().push(turns.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Worker script: exits non-zero when the input mentions CRASH, otherwise
/// echoes the input words as a comma-separated line.
pub const WORKER_SCRIPT: &str =
    r#"input=$(cat); case "$input" in *CRASH*) echo "worker crashed" >&2; exit 1;; esac; printf '%s\n' "$input" | tr ' ' ','"#;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryDiaryStore>,
    pub provider: Arc<ScriptedChatProvider>,
    pub sessions: SessionContextStore,
}

impl TestApp {
    pub fn spawn(provider: Arc<ScriptedChatProvider>, stopwords: &[&str]) -> Self {
        init_tracing();
        init_metrics();

        let store = InMemoryDiaryStore::new();
        let sessions = SessionContextStore::new(SYSTEM_PROMPT, 1_000);
        let dispatcher = ConversationTurnDispatcher::new(sessions.clone(), provider.clone());

        let executor = WorkerExecutor::new(
            "sh",
            vec!["-c".to_string(), WORKER_SCRIPT.to_string()],
            Duration::from_secs(10),
        );
        let aggregator = KeywordAggregator::new(
            Arc::new(ProcessKeywordExtractor::new(executor)),
            Arc::new(StopwordFilter::from_words(stopwords.iter().copied())),
            4,
        );
        let insights = EmotionInsights::new(store.clone(), aggregator, 3);
        let journal = EmotionJournal::new(store.clone());

        let router = build_router(AppState::new(dispatcher, insights, journal));

        Self {
            router,
            store,
            provider,
            sessions,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = self.send_raw(request).await;
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, bytes) = self.send_raw(request).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn send_raw(&self, request: Request<Body>) -> (StatusCode, axum::body::Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }
}
