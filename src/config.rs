//! Configuration management for the practice metronome
//!
//! This module provides runtime configuration loading from JSON files so the
//! starting tempo, cue asset, and audio mode can be adjusted without
//! recompilation. Missing or malformed files fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::audio::asset::AssetRef;
use crate::audio::click::{
    clamp_click_duration_ms, clamp_click_sample_rate, DEFAULT_CLICK_DURATION_MS,
    DEFAULT_CLICK_SAMPLE_RATE,
};
use crate::engine::Tempo;
use crate::error::log_tempo_error;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub metronome: MetronomeConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Metronome engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetronomeConfig {
    /// Tempo shown when the metronome screen mounts
    pub initial_bpm: u32,
    /// Cue sound
    #[serde(default)]
    pub asset: AssetRef,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            initial_bpm: Tempo::MIN.bpm(),
            asset: AssetRef::Builtin,
        }
    }
}

impl MetronomeConfig {
    /// Validated starting tempo; an invalid `initial_bpm` falls back to the slowest setting.
    pub fn initial_tempo(&self) -> Tempo {
        Tempo::new(self.initial_bpm).unwrap_or_else(|err| {
            log_tempo_error(&err, "MetronomeConfig::initial_tempo");
            Tempo::MIN
        })
    }
}

/// Capability flags handed to the audio provider when the cue is loaded.
///
/// The metronome is a foreground practice aid: it stops with the screen,
/// must be audible with the ringer switched to silent, and never records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioModeConfig {
    pub allow_background_playback: bool,
    pub plays_in_silent_mode: bool,
    pub recording_capable: bool,
}

impl Default for AudioModeConfig {
    fn default() -> Self {
        Self {
            allow_background_playback: false,
            plays_in_silent_mode: true,
            recording_capable: false,
        }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub mode: AudioModeConfig,
    /// Sample rate of the synthesized click
    pub click_sample_rate: u32,
    /// Length of the synthesized click in milliseconds
    pub click_duration_ms: f32,
}

impl AudioConfig {
    /// Copy with the click sample rate and duration pulled into the renderable range
    pub fn clamped(&self) -> Self {
        Self {
            mode: self.mode,
            click_sample_rate: clamp_click_sample_rate(self.click_sample_rate),
            click_duration_ms: clamp_click_duration_ms(self.click_duration_ms),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mode: AudioModeConfig::default(),
            click_sample_rate: DEFAULT_CLICK_SAMPLE_RATE,
            click_duration_ms: DEFAULT_CLICK_DURATION_MS,
        }
    }
}

/// Upper bound for the live event broadcast buffer
pub const MAX_EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Upper bound for the snapshot history
pub const MAX_EVENT_HISTORY: usize = 4096;

/// Event channel sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Broadcast buffer for live subscribers
    pub channel_capacity: usize,
    /// Number of recent events kept for snapshots
    pub history_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            history_capacity: 32,
        }
    }
}

impl TelemetryConfig {
    /// Copy with both capacities pulled into `1..=MAX` (history may be zero)
    pub fn clamped(&self) -> Self {
        Self {
            channel_capacity: self.channel_capacity.clamp(1, MAX_EVENT_CHANNEL_CAPACITY),
            history_capacity: self.history_capacity.min(MAX_EVENT_HISTORY),
        }
    }
}

impl AppConfig {
    /// Pull sizes that drive allocations into their supported ranges
    ///
    /// Logs a warning for each section that had to change.
    pub fn sanitized(mut self) -> Self {
        let telemetry = self.telemetry.clamped();
        if telemetry.channel_capacity != self.telemetry.channel_capacity
            || telemetry.history_capacity != self.telemetry.history_capacity
        {
            log::warn!(
                "[Config] Telemetry capacities {}/{} out of range, using {}/{}",
                self.telemetry.channel_capacity,
                self.telemetry.history_capacity,
                telemetry.channel_capacity,
                telemetry.history_capacity
            );
            self.telemetry = telemetry;
        }

        let audio = self.audio.clamped();
        if audio.click_sample_rate != self.audio.click_sample_rate
            || audio.click_duration_ms.to_bits() != self.audio.click_duration_ms.to_bits()
        {
            log::warn!(
                "[Config] Click {} Hz / {} ms out of range, using {} Hz / {} ms",
                self.audio.click_sample_rate,
                self.audio.click_duration_ms,
                audio.click_sample_rate,
                audio.click_duration_ms
            );
            self.audio = audio;
        }
        self
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    Self::sanitized(config)
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the bundled assets directory
    pub fn load() -> Self {
        Self::load_from_file("assets/metronome_config.json")
    }
}
