//! In-memory metadata store for testing and ephemeral use.
//!
//! [`InMemoryMetadataStore`] keeps all values in a `HashMap` protected by a
//! `RwLock`. It also counts successful `set` calls so tests can observe how
//! many mirror writes actually reached the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{MetaError, MetaResult};
use crate::traits::MetadataStore;

/// An in-memory implementation of [`MetadataStore`].
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    values: RwLock<HashMap<String, String>>,
    sets: AtomicUsize,
}

impl InMemoryMetadataStore {
    /// Create a new empty metadata store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Synchronous peek at a value, for assertions.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get(&self, key: &str) -> MetaResult<Option<String>> {
        if key.is_empty() {
            return Err(MetaError::EmptyKey);
        }
        let values = self.values.read().map_err(|_| MetaError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> MetaResult<()> {
        if key.is_empty() {
            return Err(MetaError::EmptyKey);
        }
        let mut values = self.values.write().map_err(|_| MetaError::LockPoisoned)?;
        values.insert(key.to_string(), value.to_string());
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_unset_key_is_none() {
        let store = InMemoryMetadataStore::new();
        assert_eq!(store.get("photos").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = InMemoryMetadataStore::new();
        store.set("photos", "[]").await.unwrap();
        assert_eq!(store.get("photos").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(store.set_count(), 1);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = InMemoryMetadataStore::new();
        store.set("photos", "a").await.unwrap();
        store.set("photos", "b").await.unwrap();
        assert_eq!(store.value("photos").as_deref(), Some("b"));
        assert_eq!(store.set_count(), 2);
    }

    #[tokio::test]
    async fn empty_key_rejected() {
        let store = InMemoryMetadataStore::new();
        assert!(matches!(store.set("", "x").await, Err(MetaError::EmptyKey)));
        assert!(matches!(store.get("").await, Err(MetaError::EmptyKey)));
        assert_eq!(store.set_count(), 0);
    }
}
