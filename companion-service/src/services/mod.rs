pub mod database;
pub mod dispatcher;
pub mod insights;
pub mod journal;
pub mod metrics;
pub mod providers;
pub mod session_store;
pub mod stopwords;

pub use database::{DiaryStore, PgDiaryStore};
pub use dispatcher::ConversationTurnDispatcher;
pub use insights::EmotionInsights;
pub use journal::EmotionJournal;
pub use metrics::{get_metrics, init_metrics};
pub use session_store::{SessionContextStore, DEFAULT_SESSION_ID};
pub use stopwords::StopwordFilter;
