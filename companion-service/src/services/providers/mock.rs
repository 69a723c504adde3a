//! Mock provider implementation for testing.

use super::{ChatProvider, ProviderError};
use crate::models::{ConversationTurn, Role};
use async_trait::async_trait;

/// Echoes the latest user turn, or fails when disabled.
pub struct MockChatProvider {
    enabled: bool,
}

impl MockChatProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NetworkError(
                "Mock chat provider not enabled".to_string(),
            ));
        }

        let last_user = turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        Ok(format!("Mock reply to: {}", last_user))
    }

    fn model(&self) -> &str {
        "mock"
    }
}
