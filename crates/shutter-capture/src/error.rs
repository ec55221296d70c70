use thiserror::Error;

/// Errors from capture sources and image fetchers.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user dismissed the capture UI.
    #[error("capture cancelled by user")]
    Cancelled,

    /// The device or user denied access to the camera or gallery.
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),

    /// No image could be produced (no device, empty script, missing file).
    #[error("no image available: {0}")]
    Unavailable(String),

    /// The requested options are out of range.
    #[error("invalid capture options: {0}")]
    InvalidOptions(String),

    /// The transient reference was already consumed or never issued.
    #[error("image reference expired: {0}")]
    ReferenceExpired(String),

    /// The fetcher does not understand this kind of reference.
    #[error("unsupported image reference: {0}")]
    UnsupportedReference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
