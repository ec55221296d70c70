//! Error types for metadata operations.

use thiserror::Error;

/// Errors that can occur during metadata operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The key is empty.
    #[error("metadata key must not be empty")]
    EmptyKey,

    /// The backing document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error in a file-backed store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal lock was poisoned by a panicking writer.
    #[error("metadata store lock poisoned")]
    LockPoisoned,
}

/// Convenience type alias for metadata operations.
pub type MetaResult<T> = std::result::Result<T, MetaError>;
