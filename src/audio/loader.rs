//! Resource fetch
//!
//! Fetches and decodes the clip on a background thread. The result is
//! handed back through a channel that the UI thread polls once per
//! frame, so the loaded state only ever changes on the UI thread.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use super::{AudioClip, DecodeError};

/// Errors that can occur while fetching the clip
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to spawn loader thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Loader thread exited without a result")]
    Disconnected,
}

/// Guess a container extension from the last path segment of a URL
///
/// Query strings and fragments are ignored.
pub fn extension_hint(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Download `url` and decode it
///
/// One GET, no retry. Non-2xx responses are errors.
pub fn fetch_clip(url: &str, timeout: Duration) -> Result<AudioClip, LoadError> {
    log::info!("Fetching {}", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("sonic-shoal/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status(status.as_u16()));
    }

    let bytes = response.bytes()?;
    log::info!("Fetched {} bytes", bytes.len());

    let clip = AudioClip::decode(bytes.to_vec(), extension_hint(url).as_deref())?;
    Ok(clip)
}

/// Handle to an in-flight fetch
pub struct ResourceLoader {
    rx: Receiver<Result<AudioClip, LoadError>>,
}

impl ResourceLoader {
    /// Start fetching `url` in the background
    ///
    /// `notify` runs on the loader thread once the result is sent
    /// (used to wake the UI).
    pub fn spawn<N>(url: String, timeout: Duration, notify: N) -> Result<Self, LoadError>
    where
        N: FnOnce() + Send + 'static,
    {
        Self::spawn_with(move || fetch_clip(&url, timeout), notify)
    }

    /// Run an arbitrary load job in the background
    pub fn spawn_with<F, N>(job: F, notify: N) -> Result<Self, LoadError>
    where
        F: FnOnce() -> Result<AudioClip, LoadError> + Send + 'static,
        N: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("clip-loader".to_string())
            .spawn(move || {
                let result = job();
                // Receiver gone means the app is shutting down
                let _ = tx.send(result);
                notify();
            })?;

        Ok(Self { rx })
    }

    /// Take the result if the fetch has finished
    ///
    /// Returns `None` while still in flight.
    pub fn try_take(&self) -> Option<Result<AudioClip, LoadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::Disconnected)),
        }
    }
}
