//! The [`MetadataStore`] trait defining the metadata storage interface.

use async_trait::async_trait;

use crate::error::MetaResult;

/// Durable string-keyed, string-valued storage.
///
/// Implementations must be thread-safe (`Send + Sync`). A `set` that returns
/// `Ok` is durable: a fresh store opened on the same backing storage returns
/// the value from `get`.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been set.
    async fn get(&self, key: &str) -> MetaResult<Option<String>>;

    /// Create or replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> MetaResult<()>;
}
