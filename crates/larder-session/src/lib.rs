//! Session store with idle expiry, bounded history and LRU eviction.
//!
//! This crate keeps per-conversation state in memory with:
//! - Idle-timeout expiry, checked lazily on every access
//! - LRU eviction to prevent unbounded memory growth
//! - A capped, FIFO-trimmed message history per session
//! - A per-user secondary index
//! - An optional fixed-interval cleanup task
//!
//! # Example
//!
//! ```rust,ignore
//! use larder_session::{SessionConfig, SessionFields, SessionStore};
//!
//! let store = SessionStore::new(
//!     SessionConfig::default()
//!         .with_max_sessions(1000)
//!         .with_session_timeout(Duration::from_secs(3600)),
//! )?;
//!
//! store.create_session("s1", SessionFields::new().with_user(7));
//! store.add_message("s1", "user", "Any ramen nearby?", None);
//! let recent = store.get_history("s1", 20);
//! ```

mod config;
mod error;
mod history;
mod index;
mod record;
mod store;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use history::BoundedHistory;
pub use record::{Message, SessionFields, SessionRecord, SessionState};
pub use store::{SessionStats, SessionStore};
