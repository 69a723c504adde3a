//! Application startup and lifecycle management.

use crate::config::CompanionConfig;
use crate::handlers;
use crate::services::providers::mock::MockChatProvider;
use crate::services::providers::openai::{OpenAiChatProvider, OpenAiConfig};
use crate::services::providers::ChatProvider;
use crate::services::{
    ConversationTurnDispatcher, DiaryStore, EmotionInsights, EmotionJournal, PgDiaryStore,
    SessionContextStore, StopwordFilter,
};
use crate::workers::{KeywordAggregator, KeywordExtractor, ProcessKeywordExtractor, WorkerExecutor};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: ConversationTurnDispatcher,
    pub insights: EmotionInsights,
    pub journal: EmotionJournal,
}

impl AppState {
    pub fn new(
        dispatcher: ConversationTurnDispatcher,
        insights: EmotionInsights,
        journal: EmotionJournal,
    ) -> Self {
        Self {
            dispatcher,
            insights,
            journal,
        }
    }
}

/// Build the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .route("/gpt", post(handlers::chat::chat))
        .route("/chat", post(handlers::chat::chat))
        .route(
            "/save-emotion-entry",
            post(handlers::diary::save_emotion_entry),
        )
        .route(
            "/get-emotion-entries",
            get(handlers::diary::get_emotion_entries),
        )
        .route(
            "/monthly-top-emotions-with-words",
            get(handlers::emotions::monthly_top_emotions_with_words),
        )
        .route(
            "/monthly-top-emotions",
            get(handlers::emotions::monthly_top_emotions),
        )
        .route(
            "/monthly-emotion-colors",
            get(handlers::emotions::monthly_emotion_colors),
        )
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CompanionConfig) -> Result<Self, AppError> {
        let diary_store = PgDiaryStore::connect(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;

        diary_store.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;

        let provider: Arc<dyn ChatProvider> = match config.llm.provider.as_str() {
            "mock" => {
                tracing::warn!("Using mock chat provider");
                Arc::new(MockChatProvider::new(true))
            }
            "openai" => Arc::new(
                OpenAiChatProvider::new(OpenAiConfig {
                    api_key: config.llm.api_key.clone(),
                    api_base: config.llm.api_base.clone(),
                    model: config.llm.model.clone(),
                    timeout: config.llm.timeout(),
                })
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}", e)))?,
            ),
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Unknown LLM_PROVIDER: {}",
                    other
                )))
            }
        };

        tracing::info!(
            provider = %config.llm.provider,
            model = %provider.model(),
            api_base = %config.llm.api_base,
            "Initialized chat provider"
        );

        let sessions = SessionContextStore::new(
            config.conversation.system_prompt.clone(),
            config.conversation.transcript_warn_turns,
        );
        let dispatcher = ConversationTurnDispatcher::new(sessions, provider);

        let stopwords = Arc::new(StopwordFilter::load(&config.extraction.stopwords_path));
        let executor = WorkerExecutor::new(
            config.extraction.worker_program.clone(),
            config.extraction.worker_args.clone(),
            config.extraction.timeout(),
        );
        let extractor: Arc<dyn KeywordExtractor> = Arc::new(ProcessKeywordExtractor::new(executor));
        let aggregator =
            KeywordAggregator::new(extractor, stopwords, config.extraction.max_concurrency);

        tracing::info!(
            program = %config.extraction.worker_program,
            args = ?config.extraction.worker_args,
            max_concurrency = config.extraction.max_concurrency,
            "Initialized keyword extraction workers"
        );

        let store: Arc<dyn DiaryStore> = Arc::new(diary_store);
        let journal = EmotionJournal::new(store.clone());
        let insights =
            EmotionInsights::new(store, aggregator, config.extraction.top_emotion_limit);

        let state = AppState::new(dispatcher, insights, journal);

        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("Companion service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Get the application state.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.http_listener, router).await
    }
}
