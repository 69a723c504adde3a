//! Chat model provider abstractions and implementations.
//!
//! The model is stateless: every call carries the full conversation.

pub mod mock;
pub mod openai;

use crate::models::ConversationTurn;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Trait for chat completion providers (e.g., OpenAI).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the assistant reply for the given ordered turns.
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String, ProviderError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
