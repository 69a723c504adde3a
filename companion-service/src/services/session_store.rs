//! In-memory conversation transcripts keyed by session identifier.

use crate::models::{ConversationTurn, SessionTranscript};
use crate::services::metrics::SESSIONS_ACTIVE;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Session identifier used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "global";

/// Process-lifetime store of session transcripts.
///
/// Each session owns its own async mutex, so work on one session never waits
/// on another. Transcripts are never evicted.
#[derive(Clone)]
pub struct SessionContextStore {
    sessions: Arc<DashMap<String, Arc<Mutex<SessionTranscript>>>>,
    system_prompt: Arc<str>,
    warn_turns: usize,
}

impl SessionContextStore {
    pub fn new(system_prompt: impl Into<String>, warn_turns: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            system_prompt: Arc::from(system_prompt.into()),
            warn_turns,
        }
    }

    /// Returns the transcript handle for `session_id`, seeding a new one with
    /// the system turn on first reference.
    pub fn get_or_create(&self, session_id: &str) -> Arc<Mutex<SessionTranscript>> {
        if let Some(existing) = self.sessions.get(session_id) {
            return existing.value().clone();
        }

        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                SESSIONS_ACTIVE.inc();
                tracing::info!(session_id = %session_id, "Created conversation session");
                Arc::new(Mutex::new(SessionTranscript::new(&self.system_prompt)))
            })
            .value()
            .clone()
    }

    /// Locks the session for exclusive use until the guard is dropped.
    pub async fn lock(&self, session_id: &str) -> SessionGuard {
        let transcript = self.get_or_create(session_id).lock_owned().await;
        SessionGuard {
            session_id: session_id.to_string(),
            transcript,
            warn_turns: self.warn_turns,
        }
    }

    /// Appends one turn to the end of the session transcript.
    pub async fn append(&self, session_id: &str, turn: ConversationTurn) {
        self.lock(session_id).await.append(turn);
    }

    /// Copy of the current turns, or `None` for an unseen session.
    pub async fn snapshot(&self, session_id: &str) -> Option<Vec<ConversationTurn>> {
        let handle = self.sessions.get(session_id).map(|entry| entry.value().clone())?;
        let transcript = handle.lock().await;
        Some(transcript.turns().to_vec())
    }

    pub async fn turn_count(&self, session_id: &str) -> usize {
        let handle = self.sessions.get(session_id).map(|entry| entry.value().clone());
        match handle {
            Some(handle) => handle.lock().await.len(),
            None => 0,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Exclusive access to one session's transcript.
pub struct SessionGuard {
    session_id: String,
    transcript: OwnedMutexGuard<SessionTranscript>,
    warn_turns: usize,
}

impl SessionGuard {
    pub fn append(&mut self, turn: ConversationTurn) {
        self.transcript.push(turn);

        if self.over_warn_threshold() {
            tracing::warn!(
                session_id = %self.session_id,
                turns = self.transcript.len(),
                threshold = self.warn_turns,
                "Conversation transcript keeps growing"
            );
        }
    }

    /// True once the transcript holds more turns than the warning threshold.
    pub fn over_warn_threshold(&self) -> bool {
        self.transcript.len() > self.warn_turns
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        self.transcript.turns()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
