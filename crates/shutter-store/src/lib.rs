//! Blob storage for Shutter.
//!
//! The blob store holds one text payload (base64-encoded image bytes) per
//! asset, keyed by a bare filename inside a single "application data"
//! partition. The store never interprets payloads.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per blob under a root directory
//!
//! # Design Rules
//!
//! 1. Names are validated before any I/O (see [`names`]).
//! 2. A write either replaces the whole payload or leaves the old one intact.
//! 3. Reading or deleting a missing blob is an error, not an empty result.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use names::validate_blob_name;
pub use traits::{BlobHandle, BlobStore};
