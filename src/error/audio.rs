// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants shared with the presentation shell.
///
/// Error code range: 1001-1005
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Click asset could not be read or decoded
    pub const ASSET_LOAD_FAILED: i32 = 1001;

    /// Device audio call (play/stop/release) was rejected
    pub const PLAYBACK_FAILED: i32 = 1002;

    /// No usable output device
    pub const DEVICE_UNAVAILABLE: i32 = 1003;

    /// Handle no longer refers to a loaded sound
    pub const HANDLE_RELEASED: i32 = 1004;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1005;
}

/// Log an audio error with structured context
///
/// Audio failures are best-effort side effects; callers log them here and
/// carry on with the state transition the user asked for.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=MetronomeEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors reported by an audio resource provider.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Asset could not be loaded into a playable handle
    AssetLoadFailed { asset: String, reason: String },

    /// A play/stop/release call was rejected by the device
    PlaybackFailed { operation: String, reason: String },

    /// Output device missing or could not be opened
    DeviceUnavailable { reason: String },

    /// The handle was already released by the provider
    HandleReleased,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl AudioError {
    pub fn playback(operation: &str, reason: impl Into<String>) -> Self {
        AudioError::PlaybackFailed {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::AssetLoadFailed { .. } => AudioErrorCodes::ASSET_LOAD_FAILED,
            AudioError::PlaybackFailed { .. } => AudioErrorCodes::PLAYBACK_FAILED,
            AudioError::DeviceUnavailable { .. } => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::HandleReleased => AudioErrorCodes::HANDLE_RELEASED,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::AssetLoadFailed { asset, reason } => {
                format!("Failed to load asset {}: {}", asset, reason)
            }
            AudioError::PlaybackFailed { operation, reason } => {
                format!("Audio {} failed: {}", operation, reason)
            }
            AudioError::DeviceUnavailable { reason } => {
                format!("Audio device unavailable: {}", reason)
            }
            AudioError::HandleReleased => "Audio handle already released".to_string(),
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::AssetLoadFailed {
            asset: "<io>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        AudioError::AssetLoadFailed {
            asset: "<wav>".to_string(),
            reason: err.to_string(),
        }
    }
}
