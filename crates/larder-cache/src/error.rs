//! Error types for cache operations.

/// Error type for cache operations.
///
/// Misses, expiry and capacity pressure are not errors; they show up as
/// `None` results and statistics. Only construction and value encoding fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store configuration cannot be used.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// A typed value could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
