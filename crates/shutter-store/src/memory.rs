use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::names::validate_blob_name;
use crate::traits::{BlobHandle, BlobStore};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`
/// and cloned on read. Data is lost when the store is dropped.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronous peek at a payload, for assertions.
    pub fn payload(&self, name: &str) -> Option<String> {
        self.blobs.read().ok()?.get(name).cloned()
    }

    /// Return a sorted list of all blob names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .blobs
            .read()
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn uri_for(name: &str) -> String {
        format!("memory://data/{name}")
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn write(&self, name: &str, data: &str) -> StoreResult<BlobHandle> {
        validate_blob_name(name)?;
        let mut map = self.blobs.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(name.to_string(), data.to_string());
        Ok(BlobHandle {
            name: name.to_string(),
            uri: Self::uri_for(name),
        })
    }

    async fn read(&self, name: &str) -> StoreResult<String> {
        validate_blob_name(name)?;
        let map = self.blobs.read().map_err(|_| StoreError::LockPoisoned)?;
        map.get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        validate_blob_name(name)?;
        let mut map = self.blobs.write().map_err(|_| StoreError::LockPoisoned)?;
        map.remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn exists(&self, name: &str) -> StoreResult<bool> {
        validate_blob_name(name)?;
        let map = self.blobs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(name))
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self.names())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read() {
        let store = InMemoryBlobStore::new();
        let handle = store.write("1000.jpeg", "QUJD").await.unwrap();
        assert_eq!(handle.name, "1000.jpeg");
        assert_eq!(handle.uri, "memory://data/1000.jpeg");
        assert_eq!(store.read("1000.jpeg").await.unwrap(), "QUJD");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn write_replaces_payload() {
        let store = InMemoryBlobStore::new();
        store.write("1.jpeg", "old").await.unwrap();
        store.write("1.jpeg", "new").await.unwrap();
        assert_eq!(store.payload("1.jpeg").as_deref(), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let store = InMemoryBlobStore::new();
        let err = store.read("nope.jpeg").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(name) if name == "nope.jpeg"));
    }

    #[tokio::test]
    async fn delete_present_then_missing() {
        let store = InMemoryBlobStore::new();
        store.write("1.jpeg", "x").await.unwrap();
        store.delete("1.jpeg").await.unwrap();
        assert!(!store.exists("1.jpeg").await.unwrap());
        assert!(matches!(store.delete("1.jpeg").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn invalid_names_rejected_before_io() {
        let store = InMemoryBlobStore::new();
        assert!(matches!(
            store.write("../x", "data").await,
            Err(StoreError::InvalidName { .. })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let store = InMemoryBlobStore::new();
        store.write("3.jpeg", "c").await.unwrap();
        store.write("1.jpeg", "a").await.unwrap();
        store.write("2.jpeg", "b").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["1.jpeg", "2.jpeg", "3.jpeg"]);
    }
}
