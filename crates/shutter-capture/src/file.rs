use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{CaptureError, CaptureResult};
use crate::options::CaptureOptions;
use crate::traits::{CaptureSource, CapturedPhoto, ImageFetcher, ImageStream};

const FILE_SCHEME: &str = "file://";

/// A capture source that "captures" an existing image file.
///
/// Every request returns a `file://` reference to the same file. This is how
/// the command-line front end imports photos on machines without a camera.
#[derive(Debug, Clone)]
pub struct FileCaptureSource {
    path: PathBuf,
}

impl FileCaptureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CaptureSource for FileCaptureSource {
    async fn request_photo(&self, options: &CaptureOptions) -> CaptureResult<CapturedPhoto> {
        options.validate()?;
        let absolute = fs::canonicalize(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                CaptureError::Unavailable(format!("{} does not exist", self.path.display()))
            }
            ErrorKind::PermissionDenied => {
                CaptureError::PermissionDenied(self.path.display().to_string())
            }
            _ => CaptureError::Io(e),
        })?;
        if !fs::metadata(&absolute).await?.is_file() {
            return Err(CaptureError::Unavailable(format!(
                "{} is not a file",
                absolute.display()
            )));
        }

        let format = absolute
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "jpeg".into());
        let uri = format!("{FILE_SCHEME}{}", absolute.display());
        debug!(%uri, quality = options.quality, source = %options.source, "file capture issued");
        Ok(CapturedPhoto { uri, format })
    }
}

/// Streams `file://` references from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl ImageFetcher for FileFetcher {
    async fn open(&self, photo: &CapturedPhoto) -> CaptureResult<ImageStream> {
        let path = photo
            .uri
            .strip_prefix(FILE_SCHEME)
            .ok_or_else(|| CaptureError::UnsupportedReference(photo.uri.clone()))?;
        let file = fs::File::open(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => CaptureError::ReferenceExpired(photo.uri.clone()),
            _ => CaptureError::Io(e),
        })?;
        Ok(Box::pin(file))
    }
}
