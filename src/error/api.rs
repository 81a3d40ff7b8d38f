// Shell API error types and constants

use crate::error::{ErrorCode, TempoError};
use log::warn;
use std::fmt;

/// API error code constants shared with the presentation shell.
///
/// Error code range: 3001-3003. Tempo rejections keep their 2001-2002 codes.
pub struct ApiErrorCodes {}

impl ApiErrorCodes {
    /// No metronome is mounted
    pub const NOT_MOUNTED: i32 = 3001;

    /// The API runtime could not be created
    pub const RUNTIME_UNAVAILABLE: i32 = 3002;

    /// The mounted-engine slot lock was poisoned
    pub const LOCK_POISONED: i32 = 3003;
}

/// Log a rejected API call with structured context
pub fn log_api_error(err: &ApiError, context: &str) {
    warn!(
        "API call rejected in {}: code={}, component=MetronomeApi, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors returned by the process-global metronome API.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Operation called before `mount_metronome` or after `unmount_metronome`
    NotMounted,

    /// The shared tokio runtime failed to build
    RuntimeUnavailable { reason: String },

    /// Mutex guarding the mounted engine was poisoned
    LockPoisoned { component: String },

    /// `metronome_set_tempo` received a value outside the tempo domain
    Tempo(TempoError),
}

impl ErrorCode for ApiError {
    fn code(&self) -> i32 {
        match self {
            ApiError::NotMounted => ApiErrorCodes::NOT_MOUNTED,
            ApiError::RuntimeUnavailable { .. } => ApiErrorCodes::RUNTIME_UNAVAILABLE,
            ApiError::LockPoisoned { .. } => ApiErrorCodes::LOCK_POISONED,
            ApiError::Tempo(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotMounted => "Metronome is not mounted".to_string(),
            ApiError::RuntimeUnavailable { reason } => {
                format!("Metronome runtime unavailable: {}", reason)
            }
            ApiError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            ApiError::Tempo(err) => err.message(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ApiError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Tempo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TempoError> for ApiError {
    fn from(err: TempoError) -> Self {
        ApiError::Tempo(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_codes() {
        assert_eq!(ApiError::NotMounted.code(), ApiErrorCodes::NOT_MOUNTED);
        assert_eq!(
            ApiError::RuntimeUnavailable {
                reason: "no threads".to_string()
            }
            .code(),
            ApiErrorCodes::RUNTIME_UNAVAILABLE
        );
        assert_eq!(
            ApiError::LockPoisoned {
                component: "engine".to_string()
            }
            .code(),
            ApiErrorCodes::LOCK_POISONED
        );
    }

    #[test]
    fn test_tempo_rejection_keeps_tempo_code() {
        let err: ApiError = TempoError::OffStep { bpm: 100 }.into();
        assert_eq!(err.code(), 2002);
        assert!(err.message().contains("got 100"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_api_error_display() {
        let display = format!("{}", ApiError::NotMounted);
        assert!(display.contains("NotMounted"));
        assert!(display.contains("3001"));
    }
}
