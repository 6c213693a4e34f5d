//! Session store with idle expiry and LRU eviction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use larder_types::{
    HasSessionConfig, SharedClock, SweeperHandle, SystemClock, UserId, spawn_sweeper,
};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::index::UserIndex;
use crate::record::{Message, SessionFields, SessionRecord};

/// Session store statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    /// Sessions physically present, including idle ones not yet swept.
    pub active_sessions: usize,
    pub max_sessions: usize,
    pub total_created: u64,
    /// Sessions removed for idling past the timeout.
    pub expired_cleaned: u64,
    /// Sessions removed to make room for new ones.
    pub evicted: u64,
    /// Users with at least one indexed session.
    pub indexed_users: usize,
    /// Sum of the JSON-encoded size of every record.
    pub approx_memory_bytes: usize,
    pub session_timeout_secs: u64,
}

/// Whether an access counts as conversational activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Refreshes LRU rank only.
    Read,
    /// Also resets the idle timer.
    Write,
}

/// Inner state protected by the store lock.
struct StoreInner {
    /// Sessions in access order; the LRU end is the eviction victim.
    sessions: LruCache<String, SessionRecord>,
    users: UserIndex,
    total_created: u64,
    expired_cleaned: u64,
    evicted: u64,
}

impl StoreInner {
    /// Remove a record and its index entry.
    fn remove(&mut self, session_id: &str) -> Option<SessionRecord> {
        let record = self.sessions.pop(session_id)?;
        if let Some(user) = &record.user_id {
            self.users.remove(user, session_id);
        }
        Some(record)
    }

    /// Fail with `NotFound`/`Expired` unless the session is live at `now`.
    /// Expired sessions are removed on the way out.
    fn ensure_live(
        &mut self,
        session_id: &str,
        now: DateTime<Utc>,
        timeout: chrono::Duration,
    ) -> Result<()> {
        let expired = match self.sessions.peek(session_id) {
            None => return Err(Error::NotFound(session_id.to_string())),
            Some(record) => record.is_idle_expired(now, timeout),
        };

        if expired {
            self.remove(session_id);
            self.expired_cleaned += 1;
            debug!(session_id = %session_id, "Session expired, removed on access");
            return Err(Error::Expired(session_id.to_string()));
        }

        Ok(())
    }

    fn evict_lru(&mut self) {
        if let Some((session_id, record)) = self.sessions.pop_lru() {
            if let Some(user) = &record.user_id {
                self.users.remove(user, &session_id);
            }
            self.evicted += 1;
            debug!(
                session_id = %session_id,
                last_accessed_at = %record.last_accessed_at,
                "Evicting least recently used session to make room"
            );
        }
    }
}

/// Thread-safe in-memory session store.
///
/// This store provides:
/// - Idle-timeout expiry driven by conversational activity
/// - LRU eviction when `max_sessions` is reached
/// - A bounded message history and a free-form context map per session
/// - A per-user index of sessions
///
/// One lock guards the sessions, the index and all bookkeeping, and every
/// operation holds it for its full duration. Missing or expired sessions are
/// routine: operations report them as `false`, `None` or an empty list.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
    config: SessionConfig,
    timeout: chrono::Duration,
    clock: SharedClock,
}

impl SessionStore {
    /// Create a store that reads the system clock.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store from any session configuration provider.
    pub fn from_config<C: HasSessionConfig>(provider: &C) -> Result<Self> {
        Self::new(SessionConfig::from_provider(provider))
    }

    /// Create a store with an explicit clock.
    pub fn with_clock(config: SessionConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;
        let timeout = chrono::Duration::from_std(config.session_timeout)
            .map_err(|e| Error::InvalidConfig(format!("session_timeout: {e}")))?;

        let inner = StoreInner {
            sessions: LruCache::unbounded(),
            users: UserIndex::new(),
            total_created: 0,
            expired_cleaned: 0,
            evicted: 0,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            config,
            timeout,
            clock,
        })
    }

    /// Get the store configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of sessions physically present.
    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    /// Check if the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().sessions.is_empty()
    }

    /// Create a session, replacing any existing session with the same id.
    ///
    /// When the store is full and `session_id` is new, the least recently
    /// accessed session is evicted first. Returns `false` only for an empty
    /// session id.
    pub fn create_session(&self, session_id: &str, fields: SessionFields) -> bool {
        if session_id.is_empty() {
            warn!(error = %Error::EmptySessionId, "Rejected session creation");
            return false;
        }

        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.remove(session_id).is_some() {
            debug!(session_id = %session_id, "Replacing existing session");
        } else if inner.sessions.len() >= self.config.max_sessions {
            inner.evict_lru();
        }

        let mut record = SessionRecord::new(session_id, now, self.config.max_history_length);
        record.apply(fields);

        if let Some(user) = &record.user_id {
            inner.users.insert(user, session_id);
        }

        debug!(
            session_id = %session_id,
            user_id = ?record.user_id.as_ref().map(UserId::as_str),
            "Session created"
        );

        inner.sessions.put(session_id.to_string(), record);
        inner.total_created += 1;
        true
    }

    /// Fetch a copy of a live session.
    ///
    /// Counts as a read: refreshes the LRU rank but not the idle timer.
    pub fn get_session(&self, session_id: &str) -> Option<SessionRecord> {
        self.with_live(session_id, Access::Read, |record| record.clone())
            .inspect_err(|e| trace!(error = %e, "Session lookup missed"))
            .ok()
    }

    /// Merge fields into a live session and reset its idle timer.
    pub fn update_session(&self, session_id: &str, fields: SessionFields) -> bool {
        self.with_live(session_id, Access::Write, |record| record.apply(fields))
            .inspect_err(|e| debug!(error = %e, "Session update rejected"))
            .is_ok()
    }

    /// Append a message to a live session's history and reset its idle timer.
    ///
    /// The oldest message is dropped once the history is at its cap.
    pub fn add_message(
        &self,
        session_id: &str,
        role: impl Into<String>,
        content: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) -> bool {
        let now = self.clock.now();
        let message = Message::new(role, content, now, metadata.unwrap_or_default());

        self.with_live(session_id, Access::Write, |record| {
            if record.history.push(message).is_some() {
                trace!(session_id = %record.session_id, "History at capacity, dropped oldest message");
            }
        })
        .inspect_err(|e| debug!(error = %e, "Message not added"))
        .is_ok()
    }

    /// The most recent `limit` messages of a session, oldest first.
    ///
    /// Empty when the session is missing or expired.
    pub fn get_history(&self, session_id: &str, limit: usize) -> Vec<Message> {
        self.with_live(session_id, Access::Read, |record| record.history.recent(limit))
            .unwrap_or_default()
    }

    /// Set one context key on a live session and reset its idle timer.
    pub fn update_context(&self, session_id: &str, key: &str, value: Value) -> bool {
        self.with_live(session_id, Access::Write, |record| {
            record.context.insert(key.to_string(), value);
        })
        .inspect_err(|e| debug!(error = %e, "Context update rejected"))
        .is_ok()
    }

    /// Remove a session. Returns whether one was present.
    pub fn delete_session(&self, session_id: &str) -> bool {
        let removed = self.inner.lock().remove(session_id).is_some();
        if removed {
            debug!(session_id = %session_id, "Session deleted");
        }
        removed
    }

    /// All live sessions of a user, oldest first.
    ///
    /// Expired sessions met along the way are removed from the store and
    /// the index.
    pub fn get_user_sessions(&self, user_id: &UserId) -> Vec<SessionRecord> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let mut sessions = Vec::new();

        for session_id in inner.users.sessions_of(user_id) {
            match inner.ensure_live(&session_id, now, self.timeout) {
                Ok(()) => {
                    if let Some(record) = inner.sessions.get_mut(&session_id) {
                        record.touch_access(now);
                        sessions.push(record.clone());
                    }
                }
                Err(Error::NotFound(_)) => {
                    inner.users.remove(user_id, &session_id);
                }
                Err(_) => {}
            }
        }

        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        sessions
    }

    /// Remove every session idle past the timeout.
    pub fn cleanup_expired_sessions(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, record)| record.is_idle_expired(now, self.timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in &expired {
            inner.remove(session_id);
        }

        let count = expired.len();
        inner.expired_cleaned += count as u64;

        if count > 0 {
            info!(count, "Cleaned up expired sessions");
        }

        count
    }

    /// Remove every session.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let count = inner.sessions.len();
        inner.sessions.clear();
        inner.users.clear();
        info!(count, "Session store cleared");
    }

    /// Check for a live session without touching its rank or timers.
    pub fn contains(&self, session_id: &str) -> bool {
        let now = self.clock.now();
        let inner = self.inner.lock();
        inner
            .sessions
            .peek(session_id)
            .is_some_and(|record| !record.is_idle_expired(now, self.timeout))
    }

    /// Get store statistics.
    pub fn stats(&self) -> SessionStats {
        let inner = self.inner.lock();

        let approx_memory_bytes = inner
            .sessions
            .iter()
            .filter_map(|(id, record)| match serde_json::to_vec(record) {
                Ok(bytes) => Some(bytes.len()),
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Failed to size session record");
                    None
                }
            })
            .sum();

        SessionStats {
            active_sessions: inner.sessions.len(),
            max_sessions: self.config.max_sessions,
            total_created: inner.total_created,
            expired_cleaned: inner.expired_cleaned,
            evicted: inner.evicted,
            indexed_users: inner.users.user_count(),
            approx_memory_bytes,
            session_timeout_secs: self.config.session_timeout.as_secs(),
        }
    }

    /// Sweep idle sessions every `cleanup_interval` on the tokio runtime.
    pub fn spawn_cleanup_task(&self) -> SweeperHandle {
        let store = self.clone();
        spawn_sweeper("session", self.config.cleanup_interval, move || {
            store.cleanup_expired_sessions()
        })
    }

    /// Run `f` against a live session under the store lock.
    ///
    /// Refreshes the LRU rank, and for writes the idle timer, then keeps the
    /// user index in step if `f` changed the owner.
    fn with_live<R>(
        &self,
        session_id: &str,
        access: Access,
        f: impl FnOnce(&mut SessionRecord) -> R,
    ) -> Result<R> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.ensure_live(session_id, now, self.timeout)?;

        let record = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::NotFound(session_id.to_string()))?;

        record.touch_access(now);
        if access == Access::Write {
            record.touch_activity(now);
        }

        let owner_before = record.user_id.clone();
        let out = f(record);
        let owner_after = record.user_id.clone();

        if owner_before != owner_after {
            inner
                .users
                .reassign(session_id, owner_before.as_ref(), owner_after.as_ref());
        }

        Ok(out)
    }
}
