use serde::{Deserialize, Serialize};
use shutter_capture::CaptureOptions;
use shutter_types::MediaFormat;

use crate::error::{CacheError, CacheResult};

/// How index mutations are mirrored to the metadata store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorPolicy {
    /// Mutations return immediately; a single background writer persists the
    /// latest snapshot, coalescing intermediate ones.
    #[default]
    WriteBehind,
    /// Mutations wait for the snapshot write before returning.
    WriteThrough,
}

/// What `restore` does when one entry's blob cannot be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestorePolicy {
    /// Log the failure, leave the entry out, keep going.
    #[default]
    Skip,
    /// Fail the whole restore; the index is left untouched.
    Abort,
}

/// Configuration for a [`PhotoCache`](crate::PhotoCache).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Metadata key holding the persisted index snapshot.
    pub snapshot_key: String,
    pub mirror: MirrorPolicy,
    pub restore_policy: RestorePolicy,
    /// Captures larger than this many bytes are rejected before any write.
    pub max_asset_bytes: u64,
    /// Format every capture is stored in.
    pub media_format: MediaFormat,
    /// Options passed to the capture source.
    pub capture: CaptureOptions,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_key: "photos".into(),
            mirror: MirrorPolicy::WriteBehind,
            restore_policy: RestorePolicy::Skip,
            max_asset_bytes: 64 * 1024 * 1024,
            media_format: MediaFormat::jpeg(),
            capture: CaptureOptions::camera(),
        }
    }
}

impl CacheConfig {
    /// Parse a TOML document; missing fields take their defaults.
    pub fn from_toml_str(raw: &str) -> CacheResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| CacheError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> CacheResult<String> {
        toml::to_string_pretty(self).map_err(|e| CacheError::Config(e.to_string()))
    }

    pub fn validate(&self) -> CacheResult<()> {
        if self.snapshot_key.is_empty() {
            return Err(CacheError::Config("snapshot_key must not be empty".into()));
        }
        let ext = &self.media_format.extension;
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(CacheError::Config(format!(
                "media_format.extension {ext:?} must be a bare extension"
            )));
        }
        if self.media_format.mime.is_empty() {
            return Err(CacheError::Config("media_format.mime must not be empty".into()));
        }
        if self.max_asset_bytes == 0 {
            return Err(CacheError::Config("max_asset_bytes must be positive".into()));
        }
        self.capture
            .validate()
            .map_err(|e| CacheError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shutter_capture::PhotoSource;

    #[test]
    fn default_config() {
        let c = CacheConfig::default();
        assert_eq!(c.snapshot_key, "photos");
        assert_eq!(c.media_format.extension, "jpeg");
        assert_eq!(c.media_format.mime, "image/jpeg");
        assert_eq!(c.capture.quality, 100);
        assert_eq!(c.capture.source, PhotoSource::Camera);
        assert_eq!(c.mirror, MirrorPolicy::WriteBehind);
        assert_eq!(c.restore_policy, RestorePolicy::Skip);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = CacheConfig::from_toml_str(
            r#"
            mirror = "write-through"
            restore_policy = "abort"

            [capture]
            quality = 75
            "#,
        )
        .unwrap();
        assert_eq!(c.mirror, MirrorPolicy::WriteThrough);
        assert_eq!(c.restore_policy, RestorePolicy::Abort);
        assert_eq!(c.capture.quality, 75);
        assert_eq!(c.capture.source, PhotoSource::Camera);
        assert_eq!(c.snapshot_key, "photos");
    }

    #[test]
    fn toml_round_trips() {
        let c = CacheConfig::default();
        let raw = c.to_toml_string().unwrap();
        assert_eq!(CacheConfig::from_toml_str(&raw).unwrap(), c);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(CacheConfig::from_toml_str(r#"snapshot_key = """#).is_err());
        assert!(CacheConfig::from_toml_str("max_asset_bytes = 0").is_err());
        assert!(CacheConfig::from_toml_str("[capture]\nquality = 150").is_err());
        assert!(CacheConfig::from_toml_str(
            "[media_format]\nextension = \"a/b\"\nmime = \"image/jpeg\""
        )
        .is_err());
        assert!(CacheConfig::from_toml_str("mirror = \"sometimes\"").is_err());
    }
}
