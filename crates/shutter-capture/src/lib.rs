//! Capture sources for Shutter.
//!
//! A [`CaptureSource`] produces a [`CapturedPhoto`]: a transient URI that
//! points at freshly captured image data and is valid only until consumed.
//! An [`ImageFetcher`] turns such a URI into an async byte stream.
//!
//! Two implementations ship with the crate:
//!
//! - [`ScriptedCaptureSource`] -- queue-driven, in-memory; both a source and
//!   a fetcher. Used by tests and demos.
//! - [`FileCaptureSource`] + [`FileFetcher`] -- "capture" an existing image
//!   file and stream it from disk.

pub mod error;
pub mod file;
pub mod options;
pub mod scripted;
pub mod traits;

pub use error::{CaptureError, CaptureResult};
pub use file::{FileCaptureSource, FileFetcher};
pub use options::{CaptureOptions, PhotoSource, ResultType};
pub use scripted::ScriptedCaptureSource;
pub use traits::{CaptureSource, CapturedPhoto, ImageFetcher, ImageStream};
