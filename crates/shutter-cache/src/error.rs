use shutter_capture::CaptureError;
use shutter_meta::MetaError;
use shutter_store::StoreError;
use shutter_types::TypeError;
use thiserror::Error;

/// Errors surfaced by the photo cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The capture source failed (user cancelled, access denied, no device).
    #[error("capture failed: {0}")]
    Capture(#[source] CaptureError),

    /// The captured image could not be read or transcoded.
    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("failed to write blob {name}: {source}")]
    StoreWrite {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to read blob {name}: {source}")]
    StoreRead {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete blob {name}: {source}")]
    StoreDelete {
        name: String,
        #[source]
        source: StoreError,
    },

    /// The persisted index snapshot is malformed.
    #[error("snapshot could not be decoded: {0}")]
    SnapshotDecode(#[source] TypeError),

    /// The metadata store failed while reading the snapshot.
    #[error("metadata store error: {0}")]
    Metadata(#[from] MetaError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type CacheResult<T> = Result<T, CacheError>;
