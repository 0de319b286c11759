use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::{BurstShape, GraphConfig, BURST_DURATION};
use crate::mapping::{FrequencyMapper, MAX_FREQUENCY, MIN_FREQUENCY, SPEED_MULTIPLIER};
use crate::pad::INITIAL_FREQUENCY;

/// Returns the path to the settings file: `~/.config/mosquito-rs/settings.json`
fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("mosquito-rs");
    path.push("settings.json");
    path
}

/// Persisted application settings.
///
/// Serialized as JSON to the platform config directory.
/// Fields use `#[serde(default)]` so that adding new settings
/// won't break existing config files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // Audio
    pub gain: f32,
    pub burst_duration: f32,

    // Mapping
    pub min_frequency: f32,
    pub max_frequency: f32,
    pub speed_multiplier: f32,
    pub initial_frequency: f32,

    // Window
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            gain: GraphConfig::default().gain,
            burst_duration: BURST_DURATION,

            min_frequency: MIN_FREQUENCY,
            max_frequency: MAX_FREQUENCY,
            speed_multiplier: SPEED_MULTIPLIER,
            initial_frequency: INITIAL_FREQUENCY,

            window_width: 600.0,
            window_height: 500.0,
        }
    }
}

impl AppSettings {
    /// Load settings from disk, falling back to defaults on any error.
    ///
    /// Writes the defaults out if there is no settings file yet.
    pub fn load() -> Self {
        let path = settings_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Failed to parse settings ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings file found ({}), using defaults", e);
                let settings = Self::default();
                settings.save();
                settings
            }
        }
    }

    /// Parse and sanitize settings from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Save settings to disk as pretty JSON.
    pub fn save(&self) {
        let path = settings_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create config directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::warn!("Failed to write settings: {}", e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize settings: {}", e);
            }
        }
    }

    /// Replace out-of-range values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(0.0..=1.0).contains(&self.gain) {
            log::warn!("Gain {} out of range, using {}", self.gain, defaults.gain);
            self.gain = defaults.gain;
        }
        if !(self.burst_duration > 0.0) {
            self.burst_duration = defaults.burst_duration;
        }
        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency) {
            log::warn!(
                "Invalid frequency range {}..{}, using defaults",
                self.min_frequency,
                self.max_frequency
            );
            self.min_frequency = defaults.min_frequency;
            self.max_frequency = defaults.max_frequency;
        }
        if !(self.speed_multiplier >= 0.0) {
            self.speed_multiplier = defaults.speed_multiplier;
        }
        self.initial_frequency = self
            .initial_frequency
            .clamp(self.min_frequency, self.max_frequency);
        if !(self.window_width > 0.0 && self.window_height > 0.0) {
            self.window_width = defaults.window_width;
            self.window_height = defaults.window_height;
        }
        self
    }

    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            gain: self.gain,
            burst: BurstShape {
                min_frequency: self.min_frequency,
                max_frequency: self.max_frequency,
                duration: self.burst_duration,
            },
        }
    }

    pub fn mapper(&self) -> FrequencyMapper {
        FrequencyMapper {
            min_frequency: self.min_frequency,
            max_frequency: self.max_frequency,
            speed_multiplier: self.speed_multiplier,
        }
    }
}
