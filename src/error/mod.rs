// Error types for the short-game trainer metronome
//
// This module defines custom error types for audio, tempo and shell API operations,
// providing structured error handling with error codes suitable for FFI communication.

mod api;
mod audio;
mod tempo;

pub use api::{log_api_error, ApiError, ApiErrorCodes};
pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use tempo::{log_tempo_error, TempoError, TempoErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
