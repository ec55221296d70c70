//! File-backed metadata store.
//!
//! All keys live in one JSON object on disk. The whole document is held in
//! memory behind an async mutex and rewritten (temp file + rename) on every
//! change, so concurrent `set` calls are applied in lock order and the file
//! always holds a complete document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{MetaError, MetaResult};
use crate::traits::MetadataStore;

/// A [`MetadataStore`] persisted as a single JSON document.
#[derive(Debug)]
pub struct FileMetadataStore {
    path: PathBuf,
    document: Mutex<BTreeMap<String, String>>,
}

impl FileMetadataStore {
    /// Open the document at `path`, creating parent directories as needed.
    ///
    /// A missing or empty file is an empty store. A file that is not a JSON
    /// object of strings fails with [`MetaError::Serialization`].
    pub async fn open(path: impl Into<PathBuf>) -> MetaResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let document = if fs::try_exists(&path).await? {
            let bytes = fs::read(&path).await?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&bytes)
                    .map_err(|e| MetaError::Serialization(format!("failed to parse {}: {e}", path.display())))?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = document.len(), "metadata store opened");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, document: &BTreeMap<String, String>) -> MetaResult<()> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| MetaError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for FileMetadataStore {
    async fn get(&self, key: &str) -> MetaResult<Option<String>> {
        if key.is_empty() {
            return Err(MetaError::EmptyKey);
        }
        let document = self.document.lock().await;
        Ok(document.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> MetaResult<()> {
        if key.is_empty() {
            return Err(MetaError::EmptyKey);
        }
        let mut document = self.document.lock().await;
        let previous = document.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&document).await {
            // Keep memory in step with disk.
            match previous {
                Some(old) => document.insert(key.to_string(), old),
                None => document.remove(key),
            };
            return Err(e);
        }
        debug!(key, bytes = value.len(), "metadata written");
        Ok(())
    }
}
