//! The photo cache: an ordered, observable asset index kept in step with the
//! blob store and the metadata store.
//!
//! # Consistency rules
//!
//! - The in-memory index is the source of truth. Every mutation is a single
//!   synchronous step (`watch::Sender::send_modify`) taken after its
//!   upstream I/O has resolved, and is followed by a snapshot mirror.
//! - `capture` writes the blob first and only then touches the index; any
//!   failure before that leaves the index and the snapshot untouched.
//! - `restore` builds the complete enriched list before publishing it in
//!   one step; observers never see a half-restored index.
//! - The snapshot for a mutation is staged with the mirror inside the same
//!   step, so concurrent mutations reach the mirror in index order.
//! - `remove` updates the index and mirror, then deletes the blob in a
//!   detached task that outlives the cache. A failed delete leaves an
//!   orphaned blob; orphans are listed by [`PhotoCache::orphans`] but not
//!   reconciled.

use std::collections::HashSet;
use std::sync::Arc;

use shutter_capture::{CaptureError, CaptureSource, ImageFetcher};
use shutter_meta::MetadataStore;
use shutter_store::{BlobStore, StoreError};
use shutter_types::{decode_snapshot, encode_snapshot, AssetRecord, KeyClock, StorageKey};
use tokio::sync::{watch, Mutex};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, RestorePolicy};
use crate::encoder::{display_reference, AssetEncoder};
use crate::error::{CacheError, CacheResult};
use crate::mirror::{SnapshotMirror, StagedSnapshot};

/// Outcome of [`PhotoCache::restore`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Entries published to the index.
    pub restored: usize,
    /// Entries left out because their blob could not be read.
    pub skipped: Vec<StorageKey>,
    /// Entries dropped because the snapshot listed their key twice.
    pub duplicates: usize,
}

/// Capture source and encoder, present only when the cache can capture.
struct CapturePipeline {
    source: Arc<dyn CaptureSource>,
    encoder: AssetEncoder,
}

/// Local photo cache.
///
/// Owns the asset index (newest first) and orchestrates the blob store, the
/// metadata store and, optionally, a capture source. Build one with
/// [`PhotoCache::builder`]; any number of caches may coexist.
pub struct PhotoCache {
    config: CacheConfig,
    blobs: Arc<dyn BlobStore>,
    meta: Arc<dyn MetadataStore>,
    clock: Arc<KeyClock>,
    capture: Option<CapturePipeline>,
    index: watch::Sender<Vec<AssetRecord>>,
    mirror: SnapshotMirror,
    deletes: TaskTracker,
    /// Serializes `flush` so one caller's reopen cannot strand another's wait.
    flushing: Mutex<()>,
}

impl PhotoCache {
    pub fn builder(blobs: Arc<dyn BlobStore>, meta: Arc<dyn MetadataStore>) -> PhotoCacheBuilder {
        PhotoCacheBuilder {
            blobs,
            meta,
            capture: None,
            clock: None,
            config: CacheConfig::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // ---- Observation ----

    /// Observe the index. The receiver yields the full index after every
    /// mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<AssetRecord>> {
        self.index.subscribe()
    }

    /// A copy of the current index, newest first.
    pub fn records(&self) -> Vec<AssetRecord> {
        self.index.borrow().clone()
    }

    pub fn get(&self, key: &StorageKey) -> Option<AssetRecord> {
        self.index
            .borrow()
            .iter()
            .find(|r| &r.storage_key == key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.index.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.borrow().is_empty()
    }

    pub fn mirror(&self) -> &SnapshotMirror {
        &self.mirror
    }

    // ---- Commands ----

    /// Capture one photo, persist it and put it at the front of the index.
    ///
    /// The returned record's display reference is the capture source's own
    /// transient URI, so it renders without a round trip through storage.
    /// On failure nothing is added and nothing is mirrored.
    pub async fn capture(&self) -> CacheResult<AssetRecord> {
        let pipeline = self.capture.as_ref().ok_or_else(|| {
            CacheError::Capture(CaptureError::Unavailable("no capture source configured".into()))
        })?;

        let photo = pipeline
            .source
            .request_photo(&self.config.capture)
            .await
            .map_err(CacheError::Capture)?;
        let encoded = pipeline.encoder.encode(&photo).await?;

        let record = AssetRecord::new(encoded.storage_key).with_display_reference(photo.uri);
        let inserted = record.clone();
        let staged = self.mutate(move |index| {
            index.retain(|r| r.storage_key != inserted.storage_key);
            index.insert(0, inserted);
            true
        });
        if let Some(staged) = staged {
            self.mirror.commit(staged).await;
        }

        info!(
            key = %record.storage_key,
            bytes = encoded.byte_len,
            format = %encoded.source_format,
            "photo captured"
        );
        Ok(record)
    }

    /// Rebuild the index from the persisted snapshot.
    ///
    /// Meant to run once at startup. Every listed blob is read and turned
    /// into a data URI before anything is published. A missing snapshot
    /// yields an empty index; a malformed one fails without touching the
    /// index. Per-entry read failures follow the configured
    /// [`RestorePolicy`]. Records captured while the restore was in flight
    /// stay ahead of the restored ones.
    pub async fn restore(&self) -> CacheResult<RestoreReport> {
        let key = &self.config.snapshot_key;
        let Some(raw) = self.meta.get(key).await? else {
            info!(key = %key, "no snapshot found, starting empty");
            return Ok(RestoreReport::default());
        };
        let entries = decode_snapshot(&raw).map_err(CacheError::SnapshotDecode)?;

        let mut report = RestoreReport::default();
        let mut restored: Vec<AssetRecord> = Vec::with_capacity(entries.len());
        for entry in entries {
            let storage_key = entry.storage_key;
            if !self.clock.observe_key(&storage_key) && storage_key.millis().is_some() {
                debug!(key = %storage_key, "key timestamp out of range, not fed to key clock");
            }
            if restored.iter().any(|r| r.storage_key == storage_key) {
                report.duplicates += 1;
                continue;
            }
            match self.load_display_reference(&storage_key).await {
                Ok(display) => restored.push(AssetRecord::new(storage_key).with_display_reference(display)),
                Err(e) => match self.config.restore_policy {
                    RestorePolicy::Abort => return Err(e),
                    RestorePolicy::Skip => {
                        warn!(key = %storage_key, error = %e, "skipping unreadable asset");
                        report.skipped.push(storage_key);
                    }
                },
            }
        }
        report.restored = restored.len();

        // A capture that finished mid-restore mirrored a snapshot without
        // the restored keys; re-mirror the merged index in that case.
        let mut staged = None;
        self.index.send_modify(|index| {
            index.retain(|r| !restored.iter().any(|x| x.storage_key == r.storage_key));
            let interleaved = !index.is_empty();
            index.append(&mut restored);
            if interleaved {
                staged = encode_for_mirror(index).map(|raw| self.mirror.stage(raw));
            }
        });
        if let Some(staged) = staged {
            self.mirror.commit(staged).await;
        }

        info!(
            restored = report.restored,
            skipped = report.skipped.len(),
            duplicates = report.duplicates,
            "index restored"
        );
        Ok(report)
    }

    /// Remove a record from the index and delete its blob.
    ///
    /// Removing a record that is not in the index is a no-op. Neither a
    /// mirror failure nor a blob delete failure is reported here; both are
    /// logged. Returns `true` if the record was present.
    pub async fn remove(&self, record: &AssetRecord) -> bool {
        self.remove_key(&record.storage_key).await
    }

    /// [`remove`](Self::remove) by key.
    pub async fn remove_key(&self, key: &StorageKey) -> bool {
        let target = key.clone();
        let staged = self.mutate(move |index| {
            let before = index.len();
            index.retain(|r| r.storage_key != target);
            index.len() != before
        });
        let Some(staged) = staged else {
            debug!(key = %key, "remove of unknown key ignored");
            return false;
        };
        self.mirror.commit(staged).await;
        self.spawn_blob_delete(key.file_name().to_string());
        info!(key = %key, "photo removed");
        true
    }

    /// Blob names in the store that no record in the index refers to.
    ///
    /// These are left behind by failed deletes or by captures whose snapshot
    /// never reached the metadata store. Sorted by name.
    pub async fn orphans(&self) -> CacheResult<Vec<String>> {
        let referenced: HashSet<String> = self
            .index
            .borrow()
            .iter()
            .map(|r| r.storage_key.file_name().to_string())
            .collect();
        let mut names = self
            .blobs
            .list()
            .await
            .map_err(|source| CacheError::StoreRead {
                name: "*".into(),
                source,
            })?;
        names.retain(|name| !referenced.contains(name));
        names.sort();
        Ok(names)
    }

    /// Wait for outstanding snapshot writes and blob deletes to finish.
    pub async fn flush(&self) {
        self.mirror.flush().await;
        let _guard = self.flushing.lock().await;
        self.deletes.close();
        self.deletes.wait().await;
        self.deletes.reopen();
    }

    // ---- Internals ----

    /// Apply `change` to the index in one step. If it reports a change, the
    /// new index is staged with the mirror before the index lock is released.
    fn mutate(
        &self,
        change: impl FnOnce(&mut Vec<AssetRecord>) -> bool,
    ) -> Option<StagedSnapshot> {
        let mut staged = None;
        self.index.send_if_modified(|index| {
            if !change(index) {
                return false;
            }
            staged = encode_for_mirror(index).map(|raw| self.mirror.stage(raw));
            true
        });
        staged
    }

    async fn load_display_reference(&self, key: &StorageKey) -> CacheResult<String> {
        let name = key.file_name();
        let payload = self
            .blobs
            .read(name)
            .await
            .map_err(|source| CacheError::StoreRead {
                name: name.to_string(),
                source,
            })?;
        if payload.trim().is_empty() {
            return Err(CacheError::StoreRead {
                name: name.to_string(),
                source: StoreError::Corrupt {
                    name: name.to_string(),
                    reason: "empty payload".into(),
                },
            });
        }
        Ok(display_reference(&payload, &self.config.media_format))
    }

    /// Delete a blob in a detached task; dropping the cache does not cancel it.
    fn spawn_blob_delete(&self, name: String) {
        let blobs = Arc::clone(&self.blobs);
        self.deletes.spawn(async move {
            if let Err(source) = blobs.delete(&name).await {
                let err = CacheError::StoreDelete { name, source };
                warn!(error = %err, "blob delete failed, blob orphaned");
            }
        });
    }
}

fn encode_for_mirror(index: &[AssetRecord]) -> Option<String> {
    match encode_snapshot(index) {
        Ok(raw) => Some(raw),
        Err(e) => {
            warn!(error = %e, "snapshot encoding failed, mirror skipped");
            None
        }
    }
}

impl std::fmt::Debug for PhotoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoCache")
            .field("records", &self.len())
            .field("can_capture", &self.capture.is_some())
            .field("mirror", &self.mirror)
            .finish()
    }
}

/// Builder for [`PhotoCache`].
pub struct PhotoCacheBuilder {
    blobs: Arc<dyn BlobStore>,
    meta: Arc<dyn MetadataStore>,
    capture: Option<(Arc<dyn CaptureSource>, Arc<dyn ImageFetcher>)>,
    clock: Option<KeyClock>,
    config: CacheConfig,
}

impl PhotoCacheBuilder {
    /// Enable [`PhotoCache::capture`] with this source and fetcher.
    pub fn capture_source(
        mut self,
        source: Arc<dyn CaptureSource>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        self.capture = Some((source, fetcher));
        self
    }

    /// Use a specific key clock instead of the system clock.
    pub fn clock(mut self, clock: KeyClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the cache. Fails on invalid configuration, or if write-behind
    /// mirroring is requested outside a Tokio runtime.
    pub fn build(self) -> CacheResult<PhotoCache> {
        self.config.validate()?;
        let clock = Arc::new(self.clock.unwrap_or_default());
        let mirror = SnapshotMirror::new(
            Arc::clone(&self.meta),
            self.config.snapshot_key.clone(),
            self.config.mirror,
        )?;

        let capture = self.capture.map(|(source, fetcher)| CapturePipeline {
            source,
            encoder: AssetEncoder::new(
                fetcher,
                Arc::clone(&self.blobs),
                Arc::clone(&clock),
                self.config.media_format.clone(),
                self.config.max_asset_bytes,
            ),
        });

        let (index, _) = watch::channel(Vec::new());
        Ok(PhotoCache {
            config: self.config,
            blobs: self.blobs,
            meta: self.meta,
            clock,
            capture,
            index,
            mirror,
            deletes: TaskTracker::new(),
            flushing: Mutex::new(()),
        })
    }
}
