use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::names::validate_blob_name;
use crate::traits::{BlobHandle, BlobStore};

/// Filesystem blob store: one file per blob directly under `root`.
///
/// Writes go to a dot-prefixed temporary file first and are renamed into
/// place, so a crash mid-write never leaves a truncated payload under the
/// real name. Dot-prefixed files are invisible to [`BlobStore::list`].
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (or create) a blob directory.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "blob store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> StoreResult<PathBuf> {
        validate_blob_name(name)?;
        Ok(self.root.join(name))
    }

    fn not_found(name: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Io(e),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, name: &str, data: &str) -> StoreResult<BlobHandle> {
        let path = self.path_for(name)?;
        let tmp = self.root.join(format!(".{name}.tmp"));
        fs::write(&tmp, data.as_bytes()).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(name, bytes = data.len(), "blob written");
        Ok(BlobHandle {
            name: name.to_string(),
            uri: format!("file://{}", path.display()),
        })
    }

    async fn read(&self, name: &str) -> StoreResult<String> {
        let path = self.path_for(name)?;
        let bytes = fs::read(&path).await.map_err(Self::not_found(name))?;
        String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    async fn delete(&self, name: &str) -> StoreResult<()> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).await.map_err(Self::not_found(name))?;
        debug!(name, "blob deleted");
        Ok(())
    }

    async fn exists(&self, name: &str) -> StoreResult<bool> {
        let path = self.path_for(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("data")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_root() {
        let (dir, store) = store().await;
        assert!(dir.path().join("data").is_dir());
        assert_eq!(store.root(), dir.path().join("data"));
    }

    #[tokio::test]
    async fn write_read_delete() {
        let (_dir, store) = store().await;
        let handle = store.write("1000.jpeg", "QUJD").await.unwrap();
        assert_eq!(handle.name, "1000.jpeg");
        assert!(handle.uri.starts_with("file://"));
        assert!(handle.uri.ends_with("1000.jpeg"));

        assert_eq!(store.read("1000.jpeg").await.unwrap(), "QUJD");
        assert!(store.exists("1000.jpeg").await.unwrap());

        store.delete("1000.jpeg").await.unwrap();
        assert!(!store.exists("1000.jpeg").await.unwrap());
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let (_dir, store) = store().await;
        assert!(matches!(store.read("x.jpeg").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("x.jpeg").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn write_leaves_no_temp_files() {
        let (_dir, store) = store().await;
        store.write("1.jpeg", "a").await.unwrap();
        store.write("1.jpeg", "b").await.unwrap();
        assert_eq!(store.read("1.jpeg").await.unwrap(), "b");

        let mut raw = std::fs::read_dir(store.root()).unwrap();
        let only = raw.next().unwrap().unwrap();
        assert_eq!(only.file_name(), "1.jpeg");
        assert!(raw.next().is_none());
    }

    #[tokio::test]
    async fn list_skips_hidden_and_directories() {
        let (_dir, store) = store().await;
        store.write("2.jpeg", "b").await.unwrap();
        store.write("1.jpeg", "a").await.unwrap();
        std::fs::write(store.root().join(".partial.tmp"), "x").unwrap();
        std::fs::create_dir(store.root().join("nested")).unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["1.jpeg", "2.jpeg"]);
    }

    #[tokio::test]
    async fn non_utf8_payload_is_corrupt() {
        let (_dir, store) = store().await;
        std::fs::write(store.root().join("bad.jpeg"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(store.read("bad.jpeg").await, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn rejects_traversal() {
        let (_dir, store) = store().await;
        assert!(matches!(
            store.write("../escape", "x").await,
            Err(StoreError::InvalidName { .. })
        ));
    }
}
