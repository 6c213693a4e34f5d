//! Error types for session store operations.

/// Error type for session store operations.
///
/// The public store API reports `NotFound`/`Expired` as `false`, `None` or an
/// empty list; only construction surfaces an error to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session was not found in the store.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Session was idle longer than the timeout.
    #[error("Session expired: {0}")]
    Expired(String),

    /// Session ids must be non-empty.
    #[error("Session id must not be empty")]
    EmptySessionId,

    /// The store configuration cannot be used.
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
