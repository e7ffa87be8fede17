//! Render module - the drawing surface
//!
//! This module provides:
//! - The fixed-size gray canvas
//! - The play button and its placement

mod canvas;

pub use canvas::{background, native_options, show, PlayButton};
