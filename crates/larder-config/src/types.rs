//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [cache]      # result cache store
//! [session]    # session store
//! [logging]    # operator binary logging
//! ```

use std::path::PathBuf;
use std::time::Duration;

use larder_types::config_defaults as defaults;
use larder_types::{ConfigProvider, HasCacheConfig, HasSessionConfig};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LarderConfig {
    /// Cache store configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSection>,

    /// Session store configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSection>,

    /// Logging configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl LarderConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not field by field.
    pub fn merge(&mut self, other: LarderConfig) {
        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.session.is_some() {
            self.session = other.session;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// The cache section, or defaults when absent.
    pub fn cache(&self) -> CacheSection {
        self.cache.clone().unwrap_or_default()
    }

    /// The session section, or defaults when absent.
    pub fn session(&self) -> SessionSection {
        self.session.clone().unwrap_or_default()
    }

    /// The logging section, or defaults when absent.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Reject values the stores cannot run with.
    pub fn validate(&self) -> Result<()> {
        let cache = self.cache();
        positive("cache.default_ttl_secs", cache.default_ttl_secs)?;
        positive("cache.max_entries", cache.max_entries as u64)?;
        positive("cache.cleanup_interval_secs", cache.cleanup_interval_secs)?;

        let session = self.session();
        positive("session.session_timeout_secs", session.session_timeout_secs)?;
        positive("session.max_sessions", session.max_sessions as u64)?;
        positive("session.cleanup_interval_secs", session.cleanup_interval_secs)?;
        positive("session.max_history_length", session.max_history_length as u64)?;

        Ok(())
    }
}

fn positive(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field: field.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Cache store configuration.
///
/// ```toml
/// [cache]
/// default_ttl_secs = 3600
/// max_entries = 1000
/// cleanup_interval_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// TTL in seconds for entries stored without an explicit TTL.
    pub default_ttl_secs: u64,
    /// Maximum number of entries before LRU eviction.
    pub max_entries: usize,
    /// Interval in seconds between sweeps of expired entries.
    pub cleanup_interval_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            default_ttl_secs: defaults::DEFAULT_TTL_SECS,
            max_entries: defaults::MAX_ENTRIES,
            cleanup_interval_secs: defaults::CLEANUP_INTERVAL_SECS,
        }
    }
}

impl ConfigProvider for CacheSection {}

impl HasCacheConfig for CacheSection {
    fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session store configuration.
///
/// ```toml
/// [session]
/// session_timeout_secs = 3600
/// max_sessions = 1000
/// cleanup_interval_secs = 300
/// max_history_length = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Idle seconds after which a session expires.
    pub session_timeout_secs: u64,
    /// Maximum number of sessions to keep before eviction.
    pub max_sessions: usize,
    /// Interval in seconds between cleanup runs.
    pub cleanup_interval_secs: u64,
    /// Messages retained per session.
    pub max_history_length: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            session_timeout_secs: defaults::SESSION_TIMEOUT_SECS,
            max_sessions: defaults::MAX_SESSIONS,
            cleanup_interval_secs: defaults::CLEANUP_INTERVAL_SECS,
            max_history_length: defaults::MAX_HISTORY_LENGTH,
        }
    }
}

impl ConfigProvider for SessionSection {}

impl HasSessionConfig for SessionSection {
    fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    fn max_history_length(&self) -> usize {
        self.max_history_length
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration for the operator binary.
///
/// ```toml
/// [logging]
/// level = "info"
/// file = "/var/log/larder/larder.log"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Optional JSON log file, written in addition to stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
