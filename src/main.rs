//! sonic-shoal - press play, hear the hatch
//!
//! Fetches one remote audio clip in the background, shows a 400×400
//! gray canvas with a single `play` button, and plays the clip once
//! per press. Presses while the clip is still sounding are ignored.

use eframe::egui;

mod audio;
mod controller;
mod render;
mod settings;

use audio::{AudioConfig, AudioEngine};
use controller::{PlaybackController, PressOutcome};
use settings::AppSettings;

const APP_NAME: &str = "sonic-shoal";

fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!("Starting {}", APP_NAME);

    let settings = AppSettings::load();

    eframe::run_native(
        APP_NAME,
        render::native_options(APP_NAME),
        Box::new(move |cc| Ok(Box::new(SonicApp::new(cc, &settings)))),
    )
}

/// Main application state
struct SonicApp {
    controller: PlaybackController<AudioEngine>,
}

impl SonicApp {
    fn new(cc: &eframe::CreationContext<'_>, settings: &AppSettings) -> Self {
        let engine = AudioEngine::new(AudioConfig {
            volume: settings.volume,
        });
        let mut controller = PlaybackController::new(settings.source_url.clone(), engine);
        log::info!("Clip source: {}", controller.resource().source_url());

        // Wake the UI when the fetch lands so the button enables right away
        let ctx = cc.egui_ctx.clone();
        controller.initialize_resources(settings.fetch_timeout(), move || ctx.request_repaint());

        Self { controller }
    }
}

impl eframe::App for SonicApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Render tick: the canvas is redrawn once per display refresh,
        // whether or not anything changed.
        ctx.request_repaint();

        self.controller.poll_resources();

        if let Some(outcome) = self.controller.render_frame(ctx) {
            match outcome {
                PressOutcome::Started => log::info!("Play pressed"),
                PressOutcome::AlreadyPlaying | PressOutcome::NotLoaded => {}
                PressOutcome::Failed(reason) => log::warn!("Play pressed, no audio: {}", reason),
            }
        }
    }
}
