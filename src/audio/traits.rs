//! Playback trait
//!
//! The controller talks to its audio output only through this trait,
//! so the press/playing logic can be driven without a sound card.

use std::sync::Arc;

use super::{AudioClip, AudioError};

/// A one-shot clip player with a queryable playing-state
pub trait Playback {
    /// Whether the clip is currently producing sound
    fn is_playing(&self) -> bool;

    /// Do the slow setup for `clip` ahead of the first press
    ///
    /// Called once when the clip finishes loading: open the device,
    /// convert the PCM, start an idle stream.
    fn prepare(&mut self, clip: &Arc<AudioClip>) -> Result<(), AudioError>;

    /// Start the clip from its first frame
    ///
    /// Implementations refuse to start while already playing, so at
    /// most one instance of the clip is ever audible. After a successful
    /// `prepare` this only flips shared state.
    fn play(&mut self, clip: &Arc<AudioClip>) -> Result<(), AudioError>;
}
