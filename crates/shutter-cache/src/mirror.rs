//! Mirrors the index snapshot to the metadata store.
//!
//! Two policies are available (see [`MirrorPolicy`]):
//!
//! - **Write-behind**: [`SnapshotMirror::publish`] hands the snapshot to a
//!   single background writer through a `watch` channel and returns. The
//!   writer always persists the newest snapshot it has seen; intermediate
//!   ones that were superseded while a write was in flight are dropped. The
//!   metadata store therefore converges on the latest index state, never on
//!   an older one.
//! - **Write-through**: `publish` performs the write itself, serialized by a
//!   FIFO async mutex. A snapshot older than one already written is skipped.
//!
//! Every snapshot carries a generation. Callers that mutate shared state
//! call [`SnapshotMirror::stage`] while still holding the lock that ordered
//! the mutation, so generations follow mutation order, then
//! [`SnapshotMirror::commit`] once the lock is released.
//!
//! Under both policies a failed write is logged and counted, never returned:
//! mirroring is a best-effort side effect of a mutation that has already
//! happened in memory.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shutter_meta::MetadataStore;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::config::MirrorPolicy;
use crate::error::{CacheError, CacheResult};

/// A snapshot waiting to be written, tagged with its generation.
type Job = Option<(u64, String)>;

enum Mode {
    WriteBehind {
        jobs: watch::Sender<Job>,
        settled: watch::Receiver<u64>,
    },
    WriteThrough {
        /// Generation of the newest snapshot written so far.
        written: Mutex<u64>,
    },
}

/// A snapshot that has been assigned its generation but may not be written
/// yet. Returned by [`SnapshotMirror::stage`].
#[derive(Debug)]
#[must_use = "a staged snapshot must be committed"]
pub struct StagedSnapshot {
    generation: u64,
    /// Held back for write-through; write-behind hands it to the writer at
    /// staging time.
    payload: Option<String>,
}

impl StagedSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Write policy for the persisted index snapshot.
pub struct SnapshotMirror {
    mode: Mode,
    writer: Arc<Writer>,
    /// Generation of the most recently published snapshot.
    generation: AtomicU64,
}

/// Shared state between the mirror and its background task.
struct Writer {
    store: Arc<dyn MetadataStore>,
    key: String,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl Writer {
    async fn write(&self, generation: u64, payload: &str) {
        match self.store.set(&self.key, payload).await {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::SeqCst);
                debug!(key = %self.key, generation, bytes = payload.len(), "snapshot mirrored");
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::SeqCst);
                warn!(key = %self.key, generation, error = %e, "snapshot mirror failed");
            }
        }
    }
}

impl SnapshotMirror {
    /// Create a mirror writing to `key` in `store`.
    ///
    /// The write-behind policy spawns its writer task, so it must be created
    /// inside a Tokio runtime.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        key: impl Into<String>,
        policy: MirrorPolicy,
    ) -> CacheResult<Self> {
        let writer = Arc::new(Writer {
            store,
            key: key.into(),
            writes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        });

        let mode = match policy {
            MirrorPolicy::WriteThrough => Mode::WriteThrough {
                written: Mutex::new(0),
            },
            MirrorPolicy::WriteBehind => {
                let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
                    CacheError::Config("write-behind mirroring requires a Tokio runtime".into())
                })?;
                let (jobs, job_rx) = watch::channel::<Job>(None);
                let (settled_tx, settled) = watch::channel(0u64);
                runtime.spawn(run_writer(Arc::clone(&writer), job_rx, settled_tx));
                Mode::WriteBehind { jobs, settled }
            }
        };

        Ok(Self {
            mode,
            writer,
            generation: AtomicU64::new(0),
        })
    }

    pub fn policy(&self) -> MirrorPolicy {
        match self.mode {
            Mode::WriteBehind { .. } => MirrorPolicy::WriteBehind,
            Mode::WriteThrough { .. } => MirrorPolicy::WriteThrough,
        }
    }

    /// Mirror a serialized snapshot. Shorthand for [`stage`](Self::stage)
    /// followed by [`commit`](Self::commit).
    ///
    /// Under write-behind this returns as soon as the snapshot is queued.
    pub async fn publish(&self, payload: String) {
        let staged = self.stage(payload);
        self.commit(staged).await;
    }

    /// Assign the next generation to `payload`. Never blocks.
    ///
    /// Under write-behind the snapshot is handed to the writer right away,
    /// replacing any queued older one.
    pub fn stage(&self, payload: String) -> StagedSnapshot {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.mode {
            Mode::WriteBehind { jobs, .. } => {
                jobs.send_replace(Some((generation, payload)));
                StagedSnapshot {
                    generation,
                    payload: None,
                }
            }
            Mode::WriteThrough { .. } => StagedSnapshot {
                generation,
                payload: Some(payload),
            },
        }
    }

    /// Finish a staged snapshot. Under write-through this performs the write
    /// unless a newer generation already landed.
    pub async fn commit(&self, staged: StagedSnapshot) {
        let Mode::WriteThrough { written } = &self.mode else {
            return;
        };
        let Some(payload) = staged.payload else {
            return;
        };
        let mut written = written.lock().await;
        if staged.generation < *written {
            debug!(key = %self.writer.key, generation = staged.generation, "superseded snapshot skipped");
            return;
        }
        self.writer.write(staged.generation, &payload).await;
        *written = staged.generation;
    }

    /// Wait until every snapshot published so far has been written (or has
    /// failed, or been superseded by a later one that was written).
    pub async fn flush(&self) {
        let target = self.generation.load(Ordering::SeqCst);
        match &self.mode {
            Mode::WriteBehind { settled, .. } => {
                let mut settled = settled.clone();
                // Err only if the writer task is gone; nothing left to wait for.
                let _ = settled.wait_for(|done| *done >= target).await;
            }
            Mode::WriteThrough { written } => {
                drop(written.lock().await);
            }
        }
    }

    /// Number of snapshot writes that reached the store.
    pub fn writes(&self) -> u64 {
        self.writer.writes.load(Ordering::SeqCst)
    }

    /// Number of snapshot writes that failed.
    pub fn failures(&self) -> u64 {
        self.writer.failures.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SnapshotMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotMirror")
            .field("policy", &self.policy())
            .field("key", &self.writer.key)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("writes", &self.writes())
            .field("failures", &self.failures())
            .finish()
    }
}

/// Background writer: persist the latest job, report its generation, repeat.
///
/// Exits once the mirror is dropped and the last queued job is written.
async fn run_writer(
    writer: Arc<Writer>,
    mut jobs: watch::Receiver<Job>,
    settled: watch::Sender<u64>,
) {
    while jobs.changed().await.is_ok() {
        let job = jobs.borrow_and_update().clone();
        if let Some((generation, payload)) = job {
            writer.write(generation, &payload).await;
            settled.send_if_modified(|done| {
                let advanced = generation > *done;
                if advanced {
                    *done = generation;
                }
                advanced
            });
        }
    }
    debug!(key = %writer.key, "snapshot writer stopped");
}
