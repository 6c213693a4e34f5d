//! Per-user secondary index.

use std::collections::{HashMap, HashSet};

use larder_types::UserId;

/// Tracks which sessions belong to which user.
///
/// Used only for lookup; it carries no ordering.
#[derive(Debug, Default)]
pub(crate) struct UserIndex {
    sessions: HashMap<UserId, HashSet<String>>,
}

impl UserIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record that `session_id` belongs to `user`.
    pub(crate) fn insert(&mut self, user: &UserId, session_id: &str) {
        self.sessions
            .entry(user.clone())
            .or_default()
            .insert(session_id.to_string());
    }

    /// Forget a session; drops the user entry once it has no sessions left.
    pub(crate) fn remove(&mut self, user: &UserId, session_id: &str) -> bool {
        let Some(ids) = self.sessions.get_mut(user) else {
            return false;
        };
        let removed = ids.remove(session_id);
        if ids.is_empty() {
            self.sessions.remove(user);
        }
        removed
    }

    /// Move a session from one owner to another.
    pub(crate) fn reassign(&mut self, session_id: &str, from: Option<&UserId>, to: Option<&UserId>) {
        if let Some(from) = from {
            self.remove(from, session_id);
        }
        if let Some(to) = to {
            self.insert(to, session_id);
        }
    }

    /// Session ids for a user, in no particular order.
    pub(crate) fn sessions_of(&self, user: &UserId) -> Vec<String> {
        self.sessions
            .get(user)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of users with at least one session.
    pub(crate) fn user_count(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn clear(&mut self) {
        self.sessions.clear();
    }
}
