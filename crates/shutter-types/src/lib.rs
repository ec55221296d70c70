//! Foundation types for Shutter, a local photo asset cache.
//!
//! This crate provides the value types shared by every other Shutter crate.
//! It performs no I/O.
//!
//! # Key Types
//!
//! - [`StorageKey`] -- Durable asset identifier, doubling as the blob filename
//! - [`MediaFormat`] -- The fixed capture format (extension + media type)
//! - [`AssetRecord`] -- One cached photo: storage key plus renderable reference
//! - [`SnapshotEntry`] -- The persisted (durable) half of an asset record
//! - [`KeyClock`] -- Monotonic millisecond clock that issues unique keys

pub mod clock;
pub mod error;
pub mod key;
pub mod record;
pub mod snapshot;

pub use clock::{KeyClock, ManualTimeSource, SystemTimeSource, TimeSource, MAX_OBSERVED_MS};
pub use error::TypeError;
pub use key::{MediaFormat, StorageKey};
pub use record::AssetRecord;
pub use snapshot::{decode_snapshot, encode_snapshot, SnapshotEntry};
