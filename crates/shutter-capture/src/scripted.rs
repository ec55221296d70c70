use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CaptureError, CaptureResult};
use crate::options::CaptureOptions;
use crate::traits::{CaptureSource, CapturedPhoto, ImageFetcher, ImageStream};

/// What the next `request_photo` call should do.
#[derive(Debug)]
enum Scripted {
    Photo(Vec<u8>),
    Cancel,
    Deny(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    queue: VecDeque<Scripted>,
    /// Issued but not yet consumed references.
    pending: HashMap<String, Vec<u8>>,
    issued: u64,
    requests: Vec<CaptureOptions>,
}

/// An in-memory capture source driven by a queue of scripted outcomes.
///
/// Each queued photo is handed out once as a `capture://scripted/<n>` URI;
/// the same value acts as the [`ImageFetcher`] for those URIs, and opening a
/// URI consumes it.
#[derive(Debug, Default)]
pub struct ScriptedCaptureSource {
    state: Mutex<ScriptState>,
}

impl ScriptedCaptureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful capture returning `bytes`.
    pub fn push_photo(&self, bytes: impl Into<Vec<u8>>) -> &Self {
        self.lock().queue.push_back(Scripted::Photo(bytes.into()));
        self
    }

    /// Queue a user cancellation.
    pub fn push_cancel(&self) -> &Self {
        self.lock().queue.push_back(Scripted::Cancel);
        self
    }

    /// Queue a permission denial.
    pub fn push_denied(&self, reason: impl Into<String>) -> &Self {
        self.lock().queue.push_back(Scripted::Deny(reason.into()));
        self
    }

    /// Options passed to every `request_photo` call so far.
    pub fn requests(&self) -> Vec<CaptureOptions> {
        self.lock().requests.clone()
    }

    /// Number of issued references not yet consumed.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CaptureSource for ScriptedCaptureSource {
    async fn request_photo(&self, options: &CaptureOptions) -> CaptureResult<CapturedPhoto> {
        options.validate()?;
        let mut state = self.lock();
        state.requests.push(options.clone());
        match state.queue.pop_front() {
            Some(Scripted::Photo(bytes)) => {
                state.issued += 1;
                let uri = format!("capture://scripted/{}", state.issued);
                state.pending.insert(uri.clone(), bytes);
                debug!(%uri, "scripted capture issued");
                Ok(CapturedPhoto {
                    uri,
                    format: "jpeg".into(),
                })
            }
            Some(Scripted::Cancel) => Err(CaptureError::Cancelled),
            Some(Scripted::Deny(reason)) => Err(CaptureError::PermissionDenied(reason)),
            None => Err(CaptureError::Unavailable("no scripted capture queued".into())),
        }
    }
}

#[async_trait]
impl ImageFetcher for ScriptedCaptureSource {
    async fn open(&self, photo: &CapturedPhoto) -> CaptureResult<ImageStream> {
        if !photo.uri.starts_with("capture://scripted/") {
            return Err(CaptureError::UnsupportedReference(photo.uri.clone()));
        }
        let bytes = self
            .lock()
            .pending
            .remove(&photo.uri)
            .ok_or_else(|| CaptureError::ReferenceExpired(photo.uri.clone()))?;
        Ok(Box::pin(Cursor::new(bytes)))
    }
}
