//! Conversation session storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::llm::{Turn, TurnRole};

/// Id of the conversation shared by requests that carry no session id.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Default session timeout (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A single conversation session.
///
/// Cloning is cheap; clones share the same history.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    turns: RwLock<Vec<Turn>>,
    last_activity: RwLock<DateTime<Utc>>,
    system_prompt: RwLock<Option<String>>,
    /// Maximum number of user/assistant turns kept. `0` keeps everything.
    history_limit: usize,
}

impl Session {
    fn new(id: String, history_limit: usize) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(SessionInner {
                id,
                turns: RwLock::new(Vec::new()),
                last_activity: RwLock::new(now),
                system_prompt: RwLock::new(None),
                history_limit,
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Set the system prompt for this session.
    pub fn set_system_prompt(&self, prompt: impl Into<String>) {
        *self
            .inner
            .system_prompt
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(prompt.into());
        self.touch();
    }

    /// Get the system prompt if set.
    #[must_use]
    pub fn system_prompt(&self) -> Option<String> {
        self.inner
            .system_prompt
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Add a user turn to the conversation.
    pub fn add_user_message(&self, content: impl Into<String>) {
        self.add_turn(Turn::user(content));
    }

    /// Add an assistant turn to the conversation.
    pub fn add_assistant_message(&self, content: impl Into<String>) {
        self.add_turn(Turn::assistant(content));
    }

    /// Add a turn, dropping the oldest ones past the history limit.
    pub fn add_turn(&self, turn: Turn) {
        let mut guard = self
            .inner
            .turns
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.push(turn);
        let limit = self.inner.history_limit;
        if limit > 0 && guard.len() > limit {
            let excess = guard.len() - limit;
            guard.drain(..excess);
        }
        drop(guard);
        self.touch();
    }

    /// Get all turns in the conversation.
    #[must_use]
    pub fn turns(&self) -> Vec<Turn> {
        self.inner
            .turns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get all turns, preceded by the system prompt when one is set.
    #[must_use]
    pub fn turns_with_system(&self) -> Vec<Turn> {
        let mut result = Vec::new();

        if let Some(prompt) = self.system_prompt() {
            result.push(Turn::system(prompt));
        }

        result.extend(self.turns());
        result
    }

    /// Get the number of turns in the conversation.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.inner
            .turns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Role of the most recent turn.
    #[must_use]
    pub fn last_role(&self) -> Option<TurnRole> {
        self.inner
            .turns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|t| t.role)
    }

    /// Clear all turns from the session.
    pub fn clear(&self) {
        self.inner
            .turns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.touch();
    }

    fn touch(&self) {
        *self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Utc::now();
    }

    /// Check if the session has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // Negative durations (clock skew) never expire.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe store for sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
    history_limit: usize,
    system_prompt: Option<String>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store with unbounded history and no system prompt.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(0, None)
    }

    /// Create a store whose sessions keep at most `history_limit` turns
    /// (`0` for unbounded) and start with `system_prompt`.
    #[must_use]
    pub fn with_settings(history_limit: usize, system_prompt: Option<String>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                history_limit,
                system_prompt,
            }),
        }
    }

    /// Create a new session with a random id.
    #[must_use]
    pub fn create(&self) -> Session {
        self.create_with_id(Uuid::new_v4().to_string())
    }

    /// Create a new session with a specific id, replacing any existing one.
    #[must_use]
    pub fn create_with_id(&self, id: impl Into<String>) -> Session {
        let id = id.into();
        let session = Session::new(id.clone(), self.inner.history_limit);
        if let Some(prompt) = &self.inner.system_prompt {
            session.set_system_prompt(prompt.clone());
        }
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session.clone());
        session
    }

    /// Get a session by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Get a session by id, creating it if it doesn't exist.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> Session {
        if let Some(session) = self.get(id) {
            return session;
        }

        let mut guard = self
            .inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(id.to_string())
            .or_insert_with(|| {
                let session = Session::new(id.to_string(), self.inner.history_limit);
                if let Some(prompt) = &self.inner.system_prompt {
                    session.set_system_prompt(prompt.clone());
                }
                session
            })
            .clone()
    }

    /// Remove a session by id.
    pub fn remove(&self, id: &str) -> Option<Session> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions that have been inactive longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self
            .inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    /// List all session ids.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
