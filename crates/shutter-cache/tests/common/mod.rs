//! Shared fixtures for the photo cache integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shutter_cache::{CacheConfig, KeyClock, PhotoCache};
use shutter_capture::ScriptedCaptureSource;
use shutter_meta::{InMemoryMetadataStore, MetaError, MetaResult, MetadataStore};
use shutter_store::{BlobHandle, BlobStore, InMemoryBlobStore, StoreError, StoreResult};
use shutter_types::ManualTimeSource;

/// Blob store wrapper whose operations can be made to fail on demand.
#[derive(Default)]
pub struct FaultyBlobStore {
    pub inner: InMemoryBlobStore,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    unreadable: Mutex<HashSet<String>>,
}

impl FaultyBlobStore {
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    pub fn make_unreadable(&self, name: &str) {
        self.unreadable.lock().unwrap().insert(name.to_string());
    }

    fn injected() -> StoreError {
        StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "injected fault"))
    }
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn write(&self, name: &str, data: &str) -> StoreResult<BlobHandle> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.write(name, data).await
    }

    async fn read(&self, name: &str) -> StoreResult<String> {
        if self.unreadable.lock().unwrap().contains(name) {
            return Err(Self::injected());
        }
        self.inner.read(name).await
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.delete(name).await
    }

    async fn exists(&self, name: &str) -> StoreResult<bool> {
        self.inner.exists(name).await
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        self.inner.list().await
    }
}

/// Metadata store wrapper with optional write failures and write latency.
#[derive(Default)]
pub struct FaultyMetadataStore {
    pub inner: InMemoryMetadataStore,
    fail_sets: AtomicBool,
    slow_sets: AtomicBool,
}

impl FaultyMetadataStore {
    pub fn fail_sets(&self, on: bool) {
        self.fail_sets.store(on, Ordering::SeqCst);
    }

    pub fn slow_sets(&self, on: bool) {
        self.slow_sets.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataStore for FaultyMetadataStore {
    async fn get(&self, key: &str) -> MetaResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> MetaResult<()> {
        if self.slow_sets.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(MetaError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected fault",
            )));
        }
        self.inner.set(key, value).await
    }
}

/// Everything a test needs to drive one cache over shared stores.
pub struct Fixture {
    pub time: Arc<ManualTimeSource>,
    pub source: Arc<ScriptedCaptureSource>,
    pub blobs: Arc<FaultyBlobStore>,
    pub meta: Arc<FaultyMetadataStore>,
}

impl Fixture {
    pub fn new(start_ms: u64) -> Self {
        Self {
            time: Arc::new(ManualTimeSource::new(start_ms)),
            source: Arc::new(ScriptedCaptureSource::new()),
            blobs: Arc::new(FaultyBlobStore::default()),
            meta: Arc::new(FaultyMetadataStore::default()),
        }
    }

    /// A fresh cache over this fixture's stores, as after a process restart.
    pub fn cache(&self) -> PhotoCache {
        self.cache_with(CacheConfig::default())
    }

    pub fn cache_with(&self, config: CacheConfig) -> PhotoCache {
        PhotoCache::builder(self.blobs.clone(), self.meta.clone())
            .capture_source(self.source.clone(), self.source.clone())
            .clock(KeyClock::with_source(Arc::clone(&self.time)))
            .config(config)
            .build()
            .unwrap()
    }

    /// Snapshot currently held by the metadata store.
    pub fn snapshot(&self) -> Option<String> {
        self.meta.inner.value("photos")
    }
}

pub fn keys(records: &[shutter_cache::AssetRecord]) -> Vec<String> {
    records.iter().map(|r| r.storage_key.to_string()).collect()
}
