//! Session records and the payloads used to create and update them.

use chrono::{DateTime, Utc};
use larder_types::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::history::BoundedHistory;

/// Field names owned by the record itself; caller-supplied extra fields
/// with these names are ignored so the flattened form stays unambiguous.
const RESERVED_FIELDS: &[&str] = &[
    "session_id",
    "user_id",
    "state",
    "created_at",
    "last_activity_at",
    "last_accessed_at",
    "access_count",
    "history",
    "context",
];

/// Coarse lifecycle marker.
///
/// Advisory only: the store never restricts transitions or rejects
/// operations based on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Active,
    Ending,
    Ended,
}

/// One entry of a session's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Caller-defined role, e.g. "user", "assistant" or "system".
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Message {
    pub fn new(
        role: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp,
            metadata,
        }
    }
}

/// Fields supplied when creating or updating a session.
///
/// Deserializes from the loose JSON objects request handlers pass around,
/// e.g. `{"user_id": 7, "source": "web"}`: known keys land in their fields,
/// everything else in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionFields {
    pub user_id: Option<UserId>,
    pub state: Option<SessionState>,
    /// Merged key by key into the record's context.
    pub context: Map<String, Value>,
    /// Merged key by key into the record's extra fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_state(mut self, state: SessionState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Everything the store keeps about one conversation.
///
/// [`SessionStore::get_session`](crate::SessionStore::get_session) hands out
/// clones, so changing a record obtained from the store has no effect on
/// the store itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: Option<UserId>,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    /// Last conversational activity; drives idle expiry.
    pub last_activity_at: DateTime<Utc>,
    /// Last access of any kind; drives LRU ranking.
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
    pub history: BoundedHistory<Message>,
    pub context: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    pub(crate) fn new(session_id: &str, now: DateTime<Utc>, max_history_length: usize) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_id: None,
            state: SessionState::Active,
            created_at: now,
            last_activity_at: now,
            last_accessed_at: now,
            access_count: 0,
            history: BoundedHistory::new(max_history_length),
            context: Map::new(),
            extra: Map::new(),
        }
    }

    /// Whether the session has been idle longer than `timeout` at `now`.
    pub fn is_idle_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_activity_at) > timeout
    }

    pub(crate) fn apply(&mut self, fields: SessionFields) {
        if let Some(user_id) = fields.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(state) = fields.state {
            self.state = state;
        }
        self.context.extend(fields.context);
        for (key, value) in fields.extra {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                debug!(session_id = %self.session_id, field = %key, "Ignoring reserved session field");
                continue;
            }
            self.extra.insert(key, value);
        }
    }

    pub(crate) fn touch_access(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = self.last_accessed_at.max(now);
        self.access_count += 1;
    }

    pub(crate) fn touch_activity(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = self.last_activity_at.max(now);
    }
}
