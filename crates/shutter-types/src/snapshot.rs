//! The persisted index snapshot.
//!
//! The snapshot is a JSON array of `{"filepath": <key>}` objects, newest
//! first. Only storage keys are durable; display references are rebuilt on
//! restore and never written here.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::key::StorageKey;
use crate::record::AssetRecord;

/// One persisted index entry.
///
/// Unknown fields are ignored on read, so snapshots written by clients that
/// also stored a display path still decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(rename = "filepath")]
    pub storage_key: StorageKey,
}

/// Serialize the durable part of an index, preserving order.
pub fn encode_snapshot(records: &[AssetRecord]) -> Result<String, TypeError> {
    let entries: Vec<SnapshotEntry> = records.iter().map(AssetRecord::to_snapshot_entry).collect();
    serde_json::to_string(&entries).map_err(|e| TypeError::Serialization(e.to_string()))
}

/// Parse a snapshot back into its ordered entries.
///
/// Any structural problem fails the whole snapshot; there is no partial
/// result.
pub fn decode_snapshot(raw: &str) -> Result<Vec<SnapshotEntry>, TypeError> {
    let entries: Vec<SnapshotEntry> =
        serde_json::from_str(raw).map_err(|e| TypeError::Serialization(e.to_string()))?;
    for entry in &entries {
        StorageKey::parse(entry.storage_key.as_str())?;
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str) -> AssetRecord {
        AssetRecord::new(StorageKey::new(key)).with_display_reference("blob:tmp")
    }

    #[test]
    fn encode_omits_display_reference() {
        let raw = encode_snapshot(&[record("2000.jpeg"), record("1000.jpeg")]).unwrap();
        assert_eq!(raw, r#"[{"filepath":"2000.jpeg"},{"filepath":"1000.jpeg"}]"#);
    }

    #[test]
    fn decode_preserves_order() {
        let entries = decode_snapshot(r#"[{"filepath":"3.jpeg"},{"filepath":"1.jpeg"},{"filepath":"2.jpeg"}]"#).unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.storage_key.as_str()).collect();
        assert_eq!(keys, vec!["3.jpeg", "1.jpeg", "2.jpeg"]);
    }

    #[test]
    fn decode_ignores_legacy_fields() {
        let entries =
            decode_snapshot(r#"[{"filepath":"1.jpeg","webviewPath":"blob:http://x"}]"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].storage_key.as_str(), "1.jpeg");
    }

    #[test]
    fn decode_empty_array() {
        assert!(decode_snapshot("[]").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_malformed() {
        assert!(matches!(decode_snapshot("{not json"), Err(TypeError::Serialization(_))));
        assert!(matches!(decode_snapshot(r#"{"filepath":"1.jpeg"}"#), Err(TypeError::Serialization(_))));
        assert!(matches!(decode_snapshot(r#"[{"path":"1.jpeg"}]"#), Err(TypeError::Serialization(_))));
    }

    #[test]
    fn decode_rejects_invalid_key() {
        assert!(matches!(decode_snapshot(r#"[{"filepath":""}]"#), Err(TypeError::InvalidKey { .. })));
    }
}
