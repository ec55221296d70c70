//! Turns a transient capture reference into a durable blob.
//!
//! Encoding reads the whole referenced stream into memory, base64-encodes
//! it (the blob store's write contract is text) and writes it under a fresh
//! storage key. A successful call performs exactly one blob write; a failed
//! call performs none.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use shutter_capture::{CapturedPhoto, ImageFetcher};
use shutter_store::{BlobHandle, BlobStore};
use shutter_types::{KeyClock, MediaFormat, StorageKey};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};

/// How many fresh keys to try before giving up on a name collision.
const MAX_KEY_ATTEMPTS: usize = 16;

/// Outcome of a successful [`AssetEncoder::encode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedAsset {
    pub storage_key: StorageKey,
    pub handle: BlobHandle,
    /// Size of the raw image, before base64.
    pub byte_len: usize,
    /// Format reported by the capture source.
    pub source_format: String,
}

/// Fetches, transcodes and stores captured images.
pub struct AssetEncoder {
    fetcher: Arc<dyn ImageFetcher>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<KeyClock>,
    format: MediaFormat,
    max_bytes: u64,
}

impl AssetEncoder {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<KeyClock>,
        format: MediaFormat,
        max_bytes: u64,
    ) -> Self {
        Self {
            fetcher,
            blobs,
            clock,
            format,
            max_bytes,
        }
    }

    /// Persist the referenced image and return its new storage key.
    pub async fn encode(&self, photo: &CapturedPhoto) -> CacheResult<EncodedAsset> {
        if !self.accepts(&photo.format) {
            warn!(
                uri = %photo.uri,
                format = %photo.format,
                stored_as = %self.format.extension,
                "capture format differs from storage format"
            );
        }
        let bytes = self.materialize(photo).await?;
        let payload = STANDARD.encode(&bytes);
        let storage_key = self.fresh_key().await?;
        let name = storage_key.file_name();

        let handle = self
            .blobs
            .write(name, &payload)
            .await
            .map_err(|source| CacheError::StoreWrite {
                name: name.to_string(),
                source,
            })?;

        debug!(key = %storage_key, bytes = bytes.len(), uri = %handle.uri, "asset encoded");
        Ok(EncodedAsset {
            storage_key,
            handle,
            byte_len: bytes.len(),
            source_format: photo.format.clone(),
        })
    }

    /// Whether a source format matches the storage format. `jpg` and `jpeg`
    /// are the same format.
    fn accepts(&self, source_format: &str) -> bool {
        let canonical = |ext: &str| match ext.to_ascii_lowercase().as_str() {
            "jpg" => "jpeg".to_string(),
            other => other.to_string(),
        };
        canonical(source_format) == canonical(&self.format.extension)
    }

    /// Read the whole referenced stream into memory, bounded by `max_bytes`.
    async fn materialize(&self, photo: &CapturedPhoto) -> CacheResult<Vec<u8>> {
        let stream = self
            .fetcher
            .open(photo)
            .await
            .map_err(|e| CacheError::Encoding(format!("cannot open {}: {e}", photo.uri)))?;

        let mut bytes = Vec::new();
        stream
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| CacheError::Encoding(format!("cannot read {}: {e}", photo.uri)))?;

        if bytes.is_empty() {
            return Err(CacheError::Encoding(format!("{} is empty", photo.uri)));
        }
        if bytes.len() as u64 > self.max_bytes {
            return Err(CacheError::Encoding(format!(
                "{} exceeds the {} byte limit",
                photo.uri, self.max_bytes
            )));
        }
        Ok(bytes)
    }

    /// Next clock key whose blob name is not already taken.
    ///
    /// The clock is monotonic within this process; the existence check also
    /// covers blobs left behind by earlier processes.
    async fn fresh_key(&self) -> CacheResult<StorageKey> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = self.clock.next_key(&self.format);
            let taken = self
                .blobs
                .exists(key.file_name())
                .await
                .map_err(|source| CacheError::StoreRead {
                    name: key.file_name().to_string(),
                    source,
                })?;
            if !taken {
                return Ok(key);
            }
            debug!(key = %key, "blob name taken, advancing key clock");
        }
        Err(CacheError::Encoding(format!(
            "no free storage key after {MAX_KEY_ATTEMPTS} attempts"
        )))
    }
}

/// Build the renderable form of a stored payload.
///
/// Payloads written by this crate are bare base64; payloads that already
/// carry a `data:…;base64,` prefix have it replaced by the configured media
/// type.
pub fn display_reference(payload: &str, format: &MediaFormat) -> String {
    format.data_uri(strip_data_uri_prefix(payload.trim()))
}

/// Strip a leading `data:<mime>;base64,` prefix, if present.
pub fn strip_data_uri_prefix(payload: &str) -> &str {
    if !payload.starts_with("data:") {
        return payload;
    }
    match payload.find(";base64,") {
        Some(idx) => &payload[idx + ";base64,".len()..],
        None => payload,
    }
}

/// Decode a stored payload back to raw image bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(strip_data_uri_prefix(payload.trim()))
}
