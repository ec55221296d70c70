//! Metadata storage for Shutter.
//!
//! A metadata store is a small durable key-value map of strings. The photo
//! cache keeps exactly one key in it: the serialized index snapshot. Values
//! are opaque to the store.
//!
//! # Modules
//!
//! - [`error`] -- Error types for metadata operations
//! - [`traits`] -- The [`MetadataStore`] trait defining the storage interface
//! - [`memory`] -- In-memory [`InMemoryMetadataStore`] for tests
//! - [`file`] -- [`FileMetadataStore`], a single JSON document on disk

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{MetaError, MetaResult};
pub use file::FileMetadataStore;
pub use memory::InMemoryMetadataStore;
pub use traits::MetadataStore;
