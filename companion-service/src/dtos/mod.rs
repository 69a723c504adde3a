pub mod chat;
pub mod diary;
pub mod emotions;

pub use chat::{ChatRequest, ChatResponse};
pub use diary::{EmotionScoreInput, EntriesQuery, SaveEntryRequest, SaveEntryResponse};
pub use emotions::MonthlyQuery;

use serde::{Deserialize, Deserializer};

/// Deserializes an optional string with surrounding whitespace removed, so
/// blank input fails a later `length(min = 1)` check.
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|value| value.map(|s| s.trim().to_string()))
}
