//! Error types for the cache layer.

use thiserror::Error;

/// Errors raised by cache stores.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Error from the SQLite backend.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while preparing the database location.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row holds values that cannot be interpreted.
    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),

    /// Unrecognized cache kind name.
    #[error("Unknown cache kind: {0}")]
    UnknownKind(String),

    /// The backend lock was poisoned by a panicking writer.
    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
