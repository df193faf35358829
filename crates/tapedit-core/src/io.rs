//! Background image loading and saving.
//!
//! [`IoWorker`] owns one thread that decodes and encodes images. Requests go
//! in over a channel and each one produces exactly one [`IoOutcome`], which
//! the owning thread picks up with [`IoWorker::try_recv`] whenever it polls.
//! Saves carry an owned snapshot of the bitmap, so the editor keeps working
//! on its own copy while the worker encodes.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::RgbaImage;
use thiserror::Error;

use crate::decode::{decode_image, DecodeError};
use crate::encode::{encode_png, EncodeError};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read {target}: {source}")]
    Read {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A writer panicked while holding the shared buffer.
    #[error("shared output buffer is poisoned")]
    Poisoned,

    #[error("failed to start I/O worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker thread is gone and cannot take requests.
    #[error("I/O worker has stopped")]
    WorkerGone,
}

/// Where image bytes come from.
pub trait ImageSource: Send {
    fn read(&mut self) -> Result<Vec<u8>, IoError>;

    /// Short human-readable name for logs.
    fn describe(&self) -> String;
}

/// Where encoded PNG bytes go.
pub trait ImageSink: Send {
    fn write(&mut self, bytes: &[u8]) -> Result<(), IoError>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for FileSource {
    fn read(&mut self) -> Result<Vec<u8>, IoError> {
        fs::read(&self.path).map_err(|source| IoError::Read {
            target: self.describe(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Bytes already in memory, e.g. handed over by a media picker.
#[derive(Debug, Clone)]
pub struct MemorySource {
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl ImageSource for MemorySource {
    fn read(&mut self) -> Result<Vec<u8>, IoError> {
        Ok(std::mem::take(&mut self.bytes))
    }

    fn describe(&self) -> String {
        format!("{} bytes in memory", self.bytes.len())
    }
}

#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        fs::write(&self.path, bytes).map_err(|source| IoError::Write {
            target: self.describe(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Output buffer shared with the caller; each save replaces its contents.
#[derive(Debug, Clone, Default)]
pub struct SharedBufferSink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the last saved bytes.
    pub fn contents(&self) -> Result<Vec<u8>, IoError> {
        self.buffer
            .lock()
            .map(|buffer| buffer.clone())
            .map_err(|_| IoError::Poisoned)
    }
}

impl ImageSink for SharedBufferSink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        let mut buffer = self.buffer.lock().map_err(|_| IoError::Poisoned)?;
        buffer.clear();
        buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn describe(&self) -> String {
        "shared buffer".to_string()
    }
}

/// Result of one request.
#[derive(Debug)]
pub enum IoOutcome {
    Loaded(Result<RgbaImage, IoError>),
    Saved(Result<(), IoError>),
}

enum IoRequest {
    Load(Box<dyn ImageSource>),
    Save {
        image: RgbaImage,
        sink: Box<dyn ImageSink>,
    },
}

/// Handle to the background I/O thread. Dropping it finishes queued
/// requests and joins the thread.
#[derive(Debug)]
pub struct IoWorker {
    requests: Option<Sender<IoRequest>>,
    outcomes: Receiver<IoOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl IoWorker {
    pub fn spawn() -> Result<Self, IoError> {
        let (request_tx, request_rx) = mpsc::channel::<IoRequest>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<IoOutcome>();

        let handle = thread::Builder::new()
            .name("tapedit-io".to_string())
            .spawn(move || {
                for request in request_rx {
                    let outcome = process(request);
                    if outcome_tx.send(outcome).is_err() {
                        break;
                    }
                }
            })
            .map_err(IoError::Spawn)?;

        Ok(Self {
            requests: Some(request_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
        })
    }

    /// Queue a load; the outcome arrives as [`IoOutcome::Loaded`].
    pub fn load(&self, source: impl ImageSource + 'static) -> Result<(), IoError> {
        self.send(IoRequest::Load(Box::new(source)))
    }

    /// Queue a PNG save of `image`; the outcome arrives as [`IoOutcome::Saved`].
    pub fn save(&self, image: RgbaImage, sink: impl ImageSink + 'static) -> Result<(), IoError> {
        self.send(IoRequest::Save {
            image,
            sink: Box::new(sink),
        })
    }

    /// Next finished outcome, if any, without blocking.
    pub fn try_recv(&self) -> Option<IoOutcome> {
        self.outcomes.try_recv().ok()
    }

    /// Wait up to `timeout` for the next outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<IoOutcome> {
        self.outcomes.recv_timeout(timeout).ok()
    }

    fn send(&self, request: IoRequest) -> Result<(), IoError> {
        self.requests
            .as_ref()
            .ok_or(IoError::WorkerGone)?
            .send(request)
            .map_err(|_| IoError::WorkerGone)
    }
}

impl Drop for IoWorker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("I/O worker panicked");
            }
        }
    }
}

fn process(request: IoRequest) -> IoOutcome {
    match request {
        IoRequest::Load(mut source) => {
            let target = source.describe();
            let result = source
                .read()
                .and_then(|bytes| decode_image(&bytes).map_err(IoError::from));
            match &result {
                Ok(image) => tracing::info!(
                    %target,
                    width = image.width(),
                    height = image.height(),
                    "image loaded"
                ),
                Err(err) => tracing::warn!(%target, %err, "image load failed"),
            }
            IoOutcome::Loaded(result)
        }
        IoRequest::Save { image, mut sink } => {
            let target = sink.describe();
            let result = encode_png(&image)
                .map_err(IoError::from)
                .and_then(|bytes| sink.write(&bytes));
            match &result {
                Ok(()) => tracing::info!(%target, "image saved"),
                Err(err) => tracing::warn!(%target, %err, "image save failed"),
            }
            IoOutcome::Saved(result)
        }
    }
}
