//! Configuration traits for decoupled config passing between crates.
//!
//! These traits allow the stores to be built from any configuration source
//! without depending on the TOML schema in `larder-config`. Each trait
//! represents one store's construction-time settings.

use std::time::Duration;

/// Base trait for all configuration types.
///
/// Implementations should be cheaply cloneable and thread-safe.
pub trait ConfigProvider: Clone + Send + Sync + 'static {}

/// Cache store configuration.
pub trait HasCacheConfig: ConfigProvider {
    /// TTL applied when `set` is called without an explicit TTL.
    fn default_ttl(&self) -> Duration;

    /// Maximum number of entries before LRU eviction.
    fn max_entries(&self) -> usize;

    /// Interval between background sweeps of expired entries.
    fn cleanup_interval(&self) -> Duration {
        defaults::cleanup_interval()
    }
}

/// Session store configuration.
///
/// Provides settings for idle expiry, LRU eviction, history bounds and
/// cleanup intervals.
pub trait HasSessionConfig: ConfigProvider {
    /// Idle time after which a session is considered expired.
    fn session_timeout(&self) -> Duration;

    /// Maximum number of sessions to keep before LRU eviction.
    fn max_sessions(&self) -> usize;

    /// Interval between cleanup runs for expired sessions.
    fn cleanup_interval(&self) -> Duration;

    /// Maximum number of messages retained per session.
    fn max_history_length(&self) -> usize {
        defaults::MAX_HISTORY_LENGTH
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Default values
// ─────────────────────────────────────────────────────────────────────────────

/// Default store configuration values.
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TTL_SECS: u64 = 3600;
    pub const MAX_ENTRIES: usize = 1000;
    pub const SESSION_TIMEOUT_SECS: u64 = 3600;
    pub const MAX_SESSIONS: usize = 1000;
    pub const CLEANUP_INTERVAL_SECS: u64 = 300;
    pub const MAX_HISTORY_LENGTH: usize = 100;
    /// Keys longer than this many characters are replaced by a digest.
    pub const MAX_KEY_CHARS: usize = 250;

    pub fn default_ttl() -> Duration {
        Duration::from_secs(DEFAULT_TTL_SECS)
    }

    pub fn session_timeout() -> Duration {
        Duration::from_secs(SESSION_TIMEOUT_SECS)
    }

    pub fn cleanup_interval() -> Duration {
        Duration::from_secs(CLEANUP_INTERVAL_SECS)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Simple wrapper types for standalone config passing
// ─────────────────────────────────────────────────────────────────────────────

/// Standalone cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfigProvider {
    pub default_ttl: Duration,
    pub max_entries: usize,
    pub cleanup_interval: Duration,
}

impl Default for CacheConfigProvider {
    fn default() -> Self {
        Self {
            default_ttl: defaults::default_ttl(),
            max_entries: defaults::MAX_ENTRIES,
            cleanup_interval: defaults::cleanup_interval(),
        }
    }
}

impl ConfigProvider for CacheConfigProvider {}

impl HasCacheConfig for CacheConfigProvider {
    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }
}

/// Standalone session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfigProvider {
    pub session_timeout: Duration,
    pub max_sessions: usize,
    pub cleanup_interval: Duration,
    pub max_history_length: usize,
}

impl Default for SessionConfigProvider {
    fn default() -> Self {
        Self {
            session_timeout: defaults::session_timeout(),
            max_sessions: defaults::MAX_SESSIONS,
            cleanup_interval: defaults::cleanup_interval(),
            max_history_length: defaults::MAX_HISTORY_LENGTH,
        }
    }
}

impl ConfigProvider for SessionConfigProvider {}

impl HasSessionConfig for SessionConfigProvider {
    fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    fn max_history_length(&self) -> usize {
        self.max_history_length
    }
}
