use async_trait::async_trait;

use crate::error::StoreResult;

/// Where a blob ended up after a successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobHandle {
    /// The bare filename the blob was written under.
    pub name: String,
    /// Backend-specific location (`file://…` for disk, `memory://…` in memory).
    pub uri: String,
}

/// Filename-keyed durable storage for text payloads.
///
/// All implementations must satisfy these invariants:
/// - `name` is a bare filename; implementations reject anything else with
///   [`StoreError::InvalidName`](crate::StoreError::InvalidName) before
///   touching storage.
/// - `write` replaces any existing payload with the same name.
/// - `read` and `delete` of a missing name return
///   [`StoreError::NotFound`](crate::StoreError::NotFound).
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `name` and return where it was stored.
    async fn write(&self, name: &str, data: &str) -> StoreResult<BlobHandle>;

    /// Read the payload stored under `name`.
    async fn read(&self, name: &str) -> StoreResult<String>;

    /// Delete the payload stored under `name`.
    async fn delete(&self, name: &str) -> StoreResult<()>;

    /// Check whether a payload exists under `name`.
    async fn exists(&self, name: &str) -> StoreResult<bool>;

    /// List all blob names, sorted.
    async fn list(&self) -> StoreResult<Vec<String>>;
}
