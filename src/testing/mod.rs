//! Testability harness utilities.
//!
//! Public so integration tests and the CLI's dry-run mode can drive the
//! engine without an audio device.

pub mod recording_provider;

pub use recording_provider::{ProviderCall, RecordedCall, RecordingProvider};

/// Let spawned tasks (schedule ticks, fire-and-forget audio calls) run to
/// their next suspension point.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
