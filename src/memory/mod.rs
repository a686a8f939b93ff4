//! Per-session conversation memory
//!
//! Bounded history of prior turns, keyed by session id. Used to resolve
//! follow-up queries ("what about yesterday?") by inheriting the
//! previous turn's intent and entity. Sessions never see each other's
//! turns; appends within one session are serialized so concurrent
//! requests cannot interleave partial state.

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::MemoryConfig;
use crate::core::types::{Intent, Language};

/// One completed pipeline turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Turn id, time-ordered.
    pub id: Uuid,

    /// The user's query as typed.
    pub query: String,

    /// English form used for processing, when translation ran.
    pub translated_query: Option<String>,

    /// Detected language.
    pub language: Language,

    /// Detected intent.
    pub intent: Intent,

    /// Resolved sensor entity, if the turn got that far.
    pub entity: Option<String>,

    /// Canonical time token, if one was recognized.
    pub time_token: Option<String>,

    /// Whether the turn produced a successful result.
    pub success: bool,

    /// Completion time.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Build a turn stamped now.
    pub fn new(query: impl Into<String>, language: Language, intent: Intent) -> Self {
        Self {
            id: Uuid::now_v7(),
            query: query.into(),
            translated_query: None,
            language,
            intent,
            entity: None,
            time_token: None,
            success: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_translated(mut self, translated: impl Into<String>) -> Self {
        self.translated_query = Some(translated.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_time_token(mut self, token: impl Into<String>) -> Self {
        self.time_token = Some(token.into());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }
}

/// Session-scoped bounded conversation history.
pub struct ConversationMemory {
    sessions: DashMap<String, Arc<Mutex<VecDeque<ConversationTurn>>>>,
    depth: usize,
}

impl ConversationMemory {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            // A session must keep at least the previous turn.
            depth: config.depth.max(1),
        }
    }

    /// Append a turn, evicting the oldest once the session is at depth.
    pub fn append(&self, session_id: &str, turn: ConversationTurn) {
        let slot = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone();

        let mut turns = slot.lock();
        if turns.len() >= self.depth {
            turns.pop_front();
        }
        tracing::debug!(
            session_id = %session_id,
            turn_id = %turn.id,
            intent = %turn.intent,
            "appending conversation turn"
        );
        turns.push_back(turn);
    }

    /// Snapshot of the session history, oldest first. Unknown sessions
    /// yield an empty list.
    pub fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        match self.sessions.get(session_id) {
            Some(slot) => slot.lock().iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// The most recent turn of the session, if any.
    pub fn last_turn(&self, session_id: &str) -> Option<ConversationTurn> {
        self.sessions
            .get(session_id)
            .and_then(|slot| slot.lock().back().cloned())
    }

    /// The most recent resolved entity in the session.
    pub fn last_entity(&self, session_id: &str) -> Option<String> {
        self.sessions.get(session_id).and_then(|slot| {
            slot.lock()
                .iter()
                .rev()
                .find_map(|turn| turn.entity.clone())
        })
    }

    /// Number of turns currently held for a session.
    pub fn depth_of(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map(|slot| slot.lock().len())
            .unwrap_or(0)
    }

    /// Drop a session's history entirely.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Number of sessions with at least one turn.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl std::fmt::Debug for ConversationMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationMemory")
            .field("sessions", &self.sessions.len())
            .field("depth", &self.depth)
            .finish()
    }
}
