//! Audio module - clip loading and playback
//!
//! This module provides:
//! - Clip decoding from fetched bytes
//! - Background resource fetch
//! - Audio engine for cpal integration

mod clip;
mod engine;
mod loader;
mod traits;

// Re-export public types
pub use clip::{AudioClip, DecodeError};
pub use engine::{AudioConfig, AudioEngine, AudioError};
pub use loader::{LoadError, ResourceLoader};
pub use traits::Playback;
