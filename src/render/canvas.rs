//! Canvas - the fixed-size drawing surface and its one button
//!
//! The surface is 400×400 points, filled with a constant light gray
//! every frame. The button sits at a fixed offset from the top-left
//! corner and never moves.

use eframe::egui::{self, Color32, Pos2, Vec2};

/// Surface size in points
pub const SURFACE_SIZE: Vec2 = Vec2::new(400.0, 400.0);

/// Background gray level (0-255)
pub const BACKGROUND_GRAY: u8 = 220;

/// A button with a fixed label and position
#[derive(Clone, Debug, PartialEq)]
pub struct PlayButton {
    label: &'static str,
    position: Pos2,
}

impl PlayButton {
    pub fn new() -> Self {
        Self {
            label: "play",
            position: Pos2::new(20.0, 20.0),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }
}

impl Default for PlayButton {
    fn default() -> Self {
        Self::new()
    }
}

/// Background color for every frame
pub fn background() -> Color32 {
    Color32::from_gray(BACKGROUND_GRAY)
}

/// Window options for the fixed-size surface
pub fn native_options(title: &str) -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(SURFACE_SIZE)
            .with_resizable(false)
            .with_title(title),
        ..Default::default()
    }
}

/// Paint the surface and the button, returns the button's response
///
/// `enabled` greys the button out; a disabled button never reports a click.
pub fn show(ctx: &egui::Context, button: &PlayButton, enabled: bool) -> egui::Response {
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(background()))
        .show(ctx, |_ui| {});

    egui::Area::new(egui::Id::new("play_button"))
        .fixed_pos(button.position())
        .show(ctx, |ui| {
            ui.add_enabled(enabled, egui::Button::new(button.label()))
        })
        .inner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frame(button: &PlayButton, enabled: bool) -> egui::Response {
        let ctx = egui::Context::default();
        let mut response = None;
        // Second pass so the area has settled after its sizing pass
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                response = Some(show(ctx, button, enabled));
            });
        }
        response.unwrap()
    }

    #[test]
    fn test_button_geometry_is_fixed() {
        let button = PlayButton::new();
        assert_eq!(button.label(), "play");
        assert_eq!(button.position(), Pos2::new(20.0, 20.0));
        assert_eq!(button, PlayButton::default());
    }

    #[test]
    fn test_button_drawn_at_fixed_offset() {
        let button = PlayButton::new();
        for enabled in [false, true] {
            let response = run_frame(&button, enabled);
            assert_eq!(response.rect.min, Pos2::new(20.0, 20.0));
            assert!(!response.clicked());
        }
    }

    #[test]
    fn test_background_is_constant_gray() {
        assert_eq!(background(), Color32::from_rgb(220, 220, 220));
        assert_eq!(background(), background());
    }

    #[test]
    fn test_native_options_fix_surface() {
        let options = native_options("test");
        assert_eq!(options.viewport.inner_size, Some(Vec2::new(400.0, 400.0)));
        assert_eq!(options.viewport.resizable, Some(false));
    }
}
