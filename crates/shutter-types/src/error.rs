use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
