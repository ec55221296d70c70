use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, CaptureResult};

/// Where the capture source should take the image from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSource {
    /// Take a new photo with the device camera.
    #[default]
    Camera,
    /// Pick an existing photo from the gallery.
    Gallery,
    /// Let the user choose between camera and gallery.
    Prompt,
}

impl std::fmt::Display for PhotoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::Gallery => write!(f, "gallery"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

/// How the capture source hands back the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// A transient URI, resolved to bytes by an [`ImageFetcher`].
    ///
    /// [`ImageFetcher`]: crate::ImageFetcher
    #[default]
    Uri,
}

/// Parameters for one capture request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Fidelity hint, 0-100.
    pub quality: u8,
    pub source: PhotoSource,
    pub result: ResultType,
}

impl CaptureOptions {
    /// Highest quality from the camera, returned as a URI.
    pub fn camera() -> Self {
        Self {
            quality: 100,
            source: PhotoSource::Camera,
            result: ResultType::Uri,
        }
    }

    pub fn validate(&self) -> CaptureResult<()> {
        if self.quality > 100 {
            return Err(CaptureError::InvalidOptions(format!(
                "quality must be 0-100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::camera()
    }
}
