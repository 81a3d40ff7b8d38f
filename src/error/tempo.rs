// Tempo validation error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Tempo error code constants shared with the presentation shell.
///
/// Error code range: 2001-2002
pub struct TempoErrorCodes {}

impl TempoErrorCodes {
    /// BPM lies outside the 60..=120 practice range
    pub const OUT_OF_RANGE: i32 = 2001;

    /// BPM is inside the range but not on a 12 BPM step
    pub const OFF_STEP: i32 = 2002;
}

/// Log a rejected tempo with structured context
pub fn log_tempo_error(err: &TempoError, context: &str) {
    warn!(
        "Tempo rejected in {}: code={}, component=MetronomeEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Tempo values the engine refuses to store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempoError {
    /// BPM below the minimum or above the maximum
    OutOfRange { bpm: u32 },

    /// BPM between the bounds but not reachable by stepping
    OffStep { bpm: u32 },
}

impl ErrorCode for TempoError {
    fn code(&self) -> i32 {
        match self {
            TempoError::OutOfRange { .. } => TempoErrorCodes::OUT_OF_RANGE,
            TempoError::OffStep { .. } => TempoErrorCodes::OFF_STEP,
        }
    }

    fn message(&self) -> String {
        match self {
            TempoError::OutOfRange { bpm } => {
                format!("Tempo must be between 60 and 120 BPM (got {})", bpm)
            }
            TempoError::OffStep { bpm } => {
                format!("Tempo must be a multiple of 12 BPM (got {})", bpm)
            }
        }
    }
}

impl fmt::Display for TempoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TempoError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TempoError {}
