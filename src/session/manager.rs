use crate::bus::ConversationKey;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const MAX_SESSION_TURNS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered conversation history for one key. In memory only.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: ConversationKey,
    turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: ConversationKey) -> Self {
        Self {
            key,
            turns: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn add_turn(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        self.updated_at = Utc::now();

        // Prune oldest turns
        if self.turns.len() > MAX_SESSION_TURNS {
            let drain_count = self.turns.len() - MAX_SESSION_TURNS;
            self.turns.drain(..drain_count);
        }
    }

    /// Append one completed exchange: the inbound text and the full reply.
    pub fn record_exchange(&mut self, user: &str, reply: &str) {
        self.add_turn(Role::User, user);
        self.add_turn(Role::Assistant, reply);
    }

    /// The most recent `max_turns` turns, oldest first.
    pub fn history(&self, max_turns: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(max_turns);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = Utc::now();
    }
}

/// Per-conversation state owned by the relay pipeline.
///
/// The outer maps are guarded by short-held std mutexes; each session has its
/// own async lock so that a slow upstream call for one key never blocks
/// another key.
pub struct SessionManager {
    sessions: Mutex<HashMap<ConversationKey, Arc<tokio::sync::Mutex<Session>>>>,
    activation: Mutex<HashMap<ConversationKey, bool>>,
    active_by_default: bool,
}

impl SessionManager {
    pub fn new(active_by_default: bool) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            activation: Mutex::new(HashMap::new()),
            active_by_default,
        }
    }

    /// Get or create the single live session for `key`.
    pub fn session(&self, key: &ConversationKey) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::new(key.clone()))))
            .clone()
    }

    fn existing(&self, key: &ConversationKey) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Drop all turns for `key`. Returns false when there was nothing to clear.
    ///
    /// Waits for any in-flight exchange on the same key so the cleared state
    /// is never overwritten by a stale append.
    pub async fn clear(&self, key: &ConversationKey) -> bool {
        let Some(session) = self.existing(key) else {
            return false;
        };
        let mut session = session.lock().await;
        let had_turns = !session.is_empty();
        session.clear();
        had_turns
    }

    pub fn is_active(&self, key: &ConversationKey) -> bool {
        self.activation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(self.active_by_default)
    }

    /// Set activation for `key`, returning the previous state.
    pub fn set_active(&self, key: &ConversationKey, active: bool) -> bool {
        let mut activation = self
            .activation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = activation
            .get(key)
            .copied()
            .unwrap_or(self.active_by_default);
        activation.insert(key.clone(), active);
        previous
    }

    /// Flip activation for `key`, returning the new state.
    pub fn toggle(&self, key: &ConversationKey) -> bool {
        let mut activation = self
            .activation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = activation
            .get(key)
            .copied()
            .unwrap_or(self.active_by_default);
        activation.insert(key.clone(), !current);
        !current
    }

    /// Number of conversations with live state objects.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(false)
    }
}
