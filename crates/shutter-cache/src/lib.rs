//! The Shutter photo cache.
//!
//! [`PhotoCache`] keeps an ordered, observable index of cached photos
//! (newest first) and keeps it consistent with two durable stores:
//!
//! - a [`BlobStore`](shutter_store::BlobStore) holding each photo's bytes as
//!   base64 text under its storage key, and
//! - a [`MetadataStore`](shutter_meta::MetadataStore) holding the index
//!   snapshot (the ordered list of storage keys) under one fixed key.
//!
//! # Operations
//!
//! - [`PhotoCache::capture`] -- capture, encode, persist, then prepend
//! - [`PhotoCache::restore`] -- rebuild the index from the snapshot at startup
//! - [`PhotoCache::remove`] -- drop from the index, then delete the blob
//!
//! Every index mutation is mirrored to the metadata store according to the
//! configured [`MirrorPolicy`].

pub mod cache;
pub mod config;
pub mod encoder;
pub mod error;
pub mod mirror;

pub use cache::{PhotoCache, PhotoCacheBuilder, RestoreReport};
pub use config::{CacheConfig, MirrorPolicy, RestorePolicy};
pub use encoder::{decode_payload, display_reference, AssetEncoder, EncodedAsset};
pub use error::{CacheError, CacheResult};
pub use mirror::{SnapshotMirror, StagedSnapshot};

// Re-export the types callers need to drive a cache.
pub use shutter_capture::{CaptureOptions, PhotoSource};
pub use shutter_types::{AssetRecord, KeyClock, MediaFormat, StorageKey};
