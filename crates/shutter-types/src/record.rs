use serde::{Deserialize, Serialize};

use crate::key::StorageKey;
use crate::snapshot::SnapshotEntry;

/// One cached photo.
///
/// The `storage_key` is durable and immutable. The `display_reference` is a
/// transient, directly renderable form of the asset's bytes (a data URI, or
/// the capture source's ephemeral URI right after capture). It is never
/// persisted; after a restart it is rebuilt from the Blob Store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub storage_key: StorageKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_reference: Option<String>,
}

impl AssetRecord {
    /// A record known only by its key, as read back from a snapshot.
    pub fn new(storage_key: StorageKey) -> Self {
        Self {
            storage_key,
            display_reference: None,
        }
    }

    pub fn with_display_reference(mut self, reference: impl Into<String>) -> Self {
        self.display_reference = Some(reference.into());
        self
    }

    /// Returns `true` if the record can be rendered without touching storage.
    pub fn is_renderable(&self) -> bool {
        self.display_reference
            .as_deref()
            .is_some_and(|r| !r.is_empty())
    }

    /// The durable half of this record.
    pub fn to_snapshot_entry(&self) -> SnapshotEntry {
        SnapshotEntry {
            storage_key: self.storage_key.clone(),
        }
    }
}

impl From<SnapshotEntry> for AssetRecord {
    fn from(entry: SnapshotEntry) -> Self {
        Self::new(entry.storage_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_not_renderable() {
        let record = AssetRecord::new(StorageKey::new("1000.jpeg"));
        assert!(!record.is_renderable());
        assert!(record.with_display_reference("").display_reference.is_some());
    }

    #[test]
    fn display_reference_makes_renderable() {
        let record = AssetRecord::new(StorageKey::new("1000.jpeg"))
            .with_display_reference("blob:capture/1");
        assert!(record.is_renderable());
    }

    #[test]
    fn snapshot_entry_drops_display_reference() {
        let record = AssetRecord::new(StorageKey::new("1000.jpeg"))
            .with_display_reference("data:image/jpeg;base64,AAAA");
        let entry = record.to_snapshot_entry();
        assert_eq!(entry.storage_key.as_str(), "1000.jpeg");
        assert_eq!(AssetRecord::from(entry).display_reference, None);
    }

    #[test]
    fn json_uses_camel_case() {
        let record = AssetRecord::new(StorageKey::new("1000.jpeg")).with_display_reference("x");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["storageKey"], "1000.jpeg");
        assert_eq!(json["displayReference"], "x");
    }
}
