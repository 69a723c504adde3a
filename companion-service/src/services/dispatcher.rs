//! Runs one conversational turn against the chat model.

use crate::models::ConversationTurn;
use crate::services::metrics::record_llm_request;
use crate::services::providers::{ChatProvider, ProviderError};
use crate::services::session_store::SessionContextStore;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct ConversationTurnDispatcher {
    store: SessionContextStore,
    provider: Arc<dyn ChatProvider>,
}

impl ConversationTurnDispatcher {
    pub fn new(store: SessionContextStore, provider: Arc<dyn ChatProvider>) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &SessionContextStore {
        &self.store
    }

    /// Appends the user message, sends the whole transcript to the model and
    /// records the reply.
    ///
    /// The session stays locked for the entire exchange, so concurrent
    /// dispatches to the same session are applied one after another. On
    /// failure the user turn remains and no assistant turn is added.
    #[tracing::instrument(skip(self, message), fields(model = %self.provider.model()))]
    pub async fn dispatch(&self, session_id: &str, message: &str) -> Result<String, ProviderError> {
        let mut session = self.store.lock(session_id).await;
        session.append(ConversationTurn::user(message));

        let start = Instant::now();
        let result = self.provider.complete(session.turns()).await;
        let elapsed = start.elapsed();

        match result {
            Ok(reply) => {
                record_llm_request("ok", elapsed.as_secs_f64());
                session.append(ConversationTurn::assistant(reply.clone()));
                tracing::info!(
                    turns = session.turns().len(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Chat turn completed"
                );
                Ok(reply)
            }
            Err(e) => {
                record_llm_request("error", elapsed.as_secs_f64());
                tracing::error!(
                    error = %e,
                    duration_ms = elapsed.as_millis() as u64,
                    "Chat model request failed"
                );
                Err(e)
            }
        }
    }
}
