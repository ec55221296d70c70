use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::CaptureResult;
use crate::options::CaptureOptions;

/// A byte stream over captured image data.
pub type ImageStream = Pin<Box<dyn AsyncRead + Send>>;

/// The result of one capture: a transient reference to the image data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// Transient URI; renderable right away, valid only until consumed.
    pub uri: String,
    /// Image format reported by the source (e.g. `jpeg`).
    pub format: String,
}

/// Produces freshly captured images on demand.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Capture one image. Fails if the user cancels or access is denied.
    async fn request_photo(&self, options: &CaptureOptions) -> CaptureResult<CapturedPhoto>;
}

/// Resolves a transient image reference to its bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Open the referenced image data as a stream.
    async fn open(&self, photo: &CapturedPhoto) -> CaptureResult<ImageStream>;
}
