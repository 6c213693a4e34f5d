//! Configuration for the session store.

use std::time::Duration;

use larder_types::{HasSessionConfig, config_defaults};

use crate::error::{Error, Result};

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which a session expires.
    /// Only conversational activity (updates, messages) resets this timer.
    pub session_timeout: Duration,

    /// Maximum number of sessions before LRU eviction.
    pub max_sessions: usize,

    /// Interval for the cleanup task (if spawned).
    pub cleanup_interval: Duration,

    /// Maximum number of messages kept per session.
    pub max_history_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: config_defaults::session_timeout(),
            max_sessions: config_defaults::MAX_SESSIONS,
            cleanup_interval: config_defaults::cleanup_interval(),
            max_history_length: config_defaults::MAX_HISTORY_LENGTH,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any session configuration provider.
    pub fn from_provider<C: HasSessionConfig>(provider: &C) -> Self {
        Self {
            session_timeout: provider.session_timeout(),
            max_sessions: provider.max_sessions(),
            cleanup_interval: provider.cleanup_interval(),
            max_history_length: provider.max_history_length(),
        }
    }

    /// Set the idle timeout.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Set the maximum number of sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Set the per-session history cap.
    pub fn with_max_history_length(mut self, max: usize) -> Self {
        self.max_history_length = max;
        self
    }

    /// Reject settings the store cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(Error::InvalidConfig(
                "max_sessions must be greater than 0".to_string(),
            ));
        }
        if self.max_history_length == 0 {
            return Err(Error::InvalidConfig(
                "max_history_length must be greater than 0".to_string(),
            ));
        }
        if self.session_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "session_timeout must be greater than 0".to_string(),
            ));
        }
        if chrono::Duration::from_std(self.session_timeout).is_err() {
            return Err(Error::InvalidConfig(
                "session_timeout is out of range".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
