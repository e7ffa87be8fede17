//! Playback controller
//!
//! Owns the audio resource and the play button, wires presses to the
//! playback engine, and paints the canvas each frame.
//!
//! ## Resource lifecycle
//!
//! ```text
//! Unloaded -> Loading -> Loaded   (press: Idle <-> Playing, owned by the engine)
//!                     \-> Failed  (no retry)
//! ```

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::audio::{AudioClip, LoadError, Playback, ResourceLoader};
use crate::render::{self, PlayButton};

/// Load state of the clip
pub enum ResourceState {
    Unloaded,
    Loading(ResourceLoader),
    Loaded(Arc<AudioClip>),
    /// Fetch or decode failed; already logged, never retried
    Failed,
}

/// The single remote clip and where it comes from
pub struct AudioResource {
    source_url: String,
    state: ResourceState,
}

impl AudioResource {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            state: ResourceState::Unloaded,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ResourceState::Loaded(_))
    }

    pub fn clip(&self) -> Option<&Arc<AudioClip>> {
        match &self.state {
            ResourceState::Loaded(clip) => Some(clip),
            _ => None,
        }
    }

    /// Pick up a finished fetch, if any
    ///
    /// Returns `true` when the state changed.
    fn poll(&mut self) -> bool {
        let result = match &self.state {
            ResourceState::Loading(loader) => match loader.try_take() {
                Some(result) => result,
                None => return false,
            },
            _ => return false,
        };

        self.finish(result);
        true
    }

    fn finish(&mut self, result: Result<AudioClip, LoadError>) {
        self.state = match result {
            Ok(clip) => {
                log::info!(
                    "Clip ready: {:.2}s, {} ch @ {} Hz",
                    clip.duration_secs(),
                    clip.channels(),
                    clip.sample_rate()
                );
                ResourceState::Loaded(Arc::new(clip))
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", self.source_url, e);
                ResourceState::Failed
            }
        };
    }
}

/// Result of one press of the play button
#[derive(Debug, Clone, PartialEq)]
pub enum PressOutcome {
    /// Playback started from the first frame
    Started,
    /// Clip still sounding; nothing happened
    AlreadyPlaying,
    /// Clip not fetched yet (or fetch failed); nothing happened
    NotLoaded,
    /// The output device refused to start
    Failed(String),
}

pub struct PlaybackController<P: Playback> {
    resource: AudioResource,
    button: PlayButton,
    playback: P,
}

impl<P: Playback> PlaybackController<P> {
    pub fn new(source_url: impl Into<String>, playback: P) -> Self {
        Self {
            resource: AudioResource::new(source_url),
            button: PlayButton::new(),
            playback,
        }
    }

    pub fn resource(&self) -> &AudioResource {
        &self.resource
    }

    /// Start fetching the clip in the background
    ///
    /// `notify` is called from the loader thread when the fetch ends.
    pub fn initialize_resources<N>(&mut self, timeout: Duration, notify: N)
    where
        N: FnOnce() + Send + 'static,
    {
        let url = self.resource.source_url.clone();
        match ResourceLoader::spawn(url, timeout, notify) {
            Ok(loader) => self.attach_loader(loader),
            Err(e) => self.resource.finish(Err(e)),
        }
    }

    /// Track an already-running fetch
    pub fn attach_loader(&mut self, loader: ResourceLoader) {
        self.resource.state = ResourceState::Loading(loader);
    }

    /// Move a finished fetch into the resource; called once per frame
    ///
    /// When the clip lands the output is prepared right away, so a
    /// press never has to touch the device.
    pub fn poll_resources(&mut self) -> bool {
        if !self.resource.poll() {
            return false;
        }

        if let Some(clip) = self.resource.clip() {
            if let Err(e) = self.playback.prepare(clip) {
                // Retried on the next press
                log::warn!("Audio output not ready: {}", e);
            }
        }
        true
    }

    pub fn on_button_pressed(&mut self) -> PressOutcome {
        let Some(clip) = self.resource.clip() else {
            log::debug!("Press ignored: clip not loaded");
            return PressOutcome::NotLoaded;
        };

        if self.playback.is_playing() {
            log::debug!("Press ignored: already playing");
            return PressOutcome::AlreadyPlaying;
        }

        match self.playback.play(clip) {
            Ok(()) => PressOutcome::Started,
            Err(e) => {
                log::error!("Playback failed: {}", e);
                PressOutcome::Failed(e.to_string())
            }
        }
    }

    /// Paint one frame and handle a press, if there was one
    pub fn render_frame(&mut self, ctx: &egui::Context) -> Option<PressOutcome> {
        let response = render::show(ctx, &self.button, self.resource.is_loaded());
        response.clicked().then(|| self.on_button_pressed())
    }
}
