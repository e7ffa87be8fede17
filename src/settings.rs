use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Clip played by default
pub const DEFAULT_SOURCE_URL: &str = "https://raw.githubusercontent.com/daisyoll/SonicShoal/main/Submarine%20Hatch%20Outer%20Open%20Or%20Close%20-%20QuickSounds.com.mp3";

/// Returns the path to the settings file: `~/.config/sonic-shoal/settings.json`
fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sonic-shoal");
    path.push("settings.json");
    path
}

/// Application settings.
///
/// Read from JSON in the platform config directory. Fields use
/// `#[serde(default)]` so a partial file only overrides what it names.
/// Playback state is never written here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Where to fetch the clip from
    pub source_url: String,

    /// Output gain (0.0 to 1.0)
    pub volume: f32,

    /// Whole-request timeout for the fetch
    pub fetch_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            volume: 1.0,
            fetch_timeout_secs: 30,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    /// Load settings from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings.sanitized()
                }
                Err(e) => {
                    log::warn!("Failed to parse settings ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings file found ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Clamp out-of-range values back into something playable
    fn sanitized(mut self) -> Self {
        if !self.volume.is_finite() {
            log::warn!("Ignoring non-finite volume");
            self.volume = 1.0;
        }
        self.volume = self.volume.clamp(0.0, 1.0);
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = Self::default().fetch_timeout_secs;
        }
        if self.source_url.trim().is_empty() {
            log::warn!("Empty source_url, using default clip");
            self.source_url = DEFAULT_SOURCE_URL.to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("sonic-shoal-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("sonic-shoal-does-not-exist.json");
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_file("partial", r#"{ "volume": 0.25 }"#);
        let settings = AppSettings::load_from(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.volume, 0.25);
        assert_eq!(settings.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_bad_json_gives_defaults() {
        let path = temp_file("bad", "not json");
        let settings = AppSettings::load_from(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let path = temp_file(
            "clamp",
            r#"{ "volume": 3.0, "fetch_timeout_secs": 0, "source_url": "  " }"#,
        );
        let settings = AppSettings::load_from(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.fetch_timeout_secs, 30);
        assert_eq!(settings.source_url, DEFAULT_SOURCE_URL);
    }
}
