use serde::{Deserialize, Serialize};
use validator::Validate;

use super::trimmed;
use crate::services::DEFAULT_SESSION_ID;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "message is required"),
        length(min = 1, message = "message cannot be empty")
    )]
    pub message: Option<String>,
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Session to dispatch into, `"global"` when the caller names none.
    pub fn session_id(&self) -> &str {
        self.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}
