/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob does not exist.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The blob name is not a valid bare filename.
    #[error("invalid blob name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The payload on disk is not valid UTF-8 text.
    #[error("corrupt blob {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal lock was poisoned by a panicking writer.
    #[error("blob store lock poisoned")]
    LockPoisoned,
}

/// Result alias for blob store operations.
pub type StoreResult<T> = Result<T, StoreError>;
