pub mod conversation;
pub mod diary;
pub mod emotion;

pub use conversation::{ConversationTurn, Role, SessionTranscript};
pub use diary::{DiaryEntry, EmotionScore, NewDiaryEntry};
pub use emotion::{DailyEmotion, EmotionBucket, EmotionCount, ExtractionResult, MonthPeriod};
