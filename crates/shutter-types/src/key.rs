use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Durable identifier of a cached asset.
///
/// A storage key is assigned once, when the asset's bytes are first written,
/// and never changes afterwards. It doubles as the filename under which the
/// Blob Store keeps the asset's payload. Keys issued by a [`KeyClock`] have
/// the shape `<unix-millis>.<extension>`, e.g. `1700000000000.jpeg`.
///
/// [`KeyClock`]: crate::KeyClock
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Wrap a key without validation.
    ///
    /// Use [`StorageKey::parse`] for untrusted input.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build the key for an asset captured at `millis` in the given format.
    pub fn from_millis(millis: u64, format: &MediaFormat) -> Self {
        Self(format!("{millis}.{}", format.extension))
    }

    /// Parse and validate a key supplied from outside the cache.
    pub fn parse(key: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if key.is_empty() {
            return Err(invalid("key is empty"));
        }
        if key.contains('\0') {
            return Err(invalid("key contains a NUL byte"));
        }
        if key.ends_with('/') {
            return Err(invalid("key has no file name"));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare filename of this key: everything after the last `/`.
    ///
    /// Keys written by older clients may carry a full storage path; the blob
    /// lives under the final path segment either way.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// The capture timestamp encoded in the key, if the key has the
    /// `<millis>.<ext>` shape.
    pub fn millis(&self) -> Option<u64> {
        let name = self.file_name();
        let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
        stem.parse().ok()
    }

    /// The capture time encoded in the key, as a UTC timestamp.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.millis()?).ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The fixed format every capture is stored in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaFormat {
    /// File extension appended to storage keys, without the dot.
    pub extension: String,
    /// Media type used when building inline data URIs.
    pub mime: String,
}

impl MediaFormat {
    pub fn jpeg() -> Self {
        Self {
            extension: "jpeg".into(),
            mime: "image/jpeg".into(),
        }
    }

    /// Prefix of a base64 data URI for this format, up to and including the comma.
    pub fn data_uri_prefix(&self) -> String {
        format!("data:{};base64,", self.mime)
    }

    /// Embed a base64 payload as a directly renderable data URI.
    pub fn data_uri(&self, base64_payload: &str) -> String {
        format!("{}{base64_payload}", self.data_uri_prefix())
    }
}

impl Default for MediaFormat {
    fn default() -> Self {
        Self::jpeg()
    }
}
