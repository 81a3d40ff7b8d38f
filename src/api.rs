// Public API for the presentation shell
// Process-global entry points mirroring the metronome component lifecycle

use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Runtime};

use crate::audio::AudioResourceProvider;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::engine::{MetronomeStatus, Tempo};
use crate::error::ApiError;

// Re-export error code constants for FFI exposure
pub use crate::error::{ApiErrorCodes, AudioErrorCodes, TempoErrorCodes};

mod streams;
mod types;

pub use streams::metronome_event_stream;
pub use types::TempoOption;

/// Runtime driving every mounted engine's schedule and audio calls
///
/// Built lazily on first use; shells calling in from foreign threads never
/// need their own tokio context.
static RUNTIME: Lazy<Result<Runtime, String>> = Lazy::new(|| {
    Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("metronome-runtime")
        .enable_all()
        .build()
        .map_err(|err| err.to_string())
});

/// Global AppContext instance holding the mounted metronome
static APP_CONTEXT: Lazy<Result<AppContext, ApiError>> = Lazy::new(|| match &*RUNTIME {
    Ok(runtime) => Ok(AppContext::new(runtime.handle().clone())),
    Err(reason) => {
        log::error!("[MetronomeApi] Failed to build runtime: {}", reason);
        Err(ApiError::RuntimeUnavailable {
            reason: reason.clone(),
        })
    }
});

fn context() -> Result<&'static AppContext, ApiError> {
    APP_CONTEXT.as_ref().map_err(Clone::clone)
}

/// Provider used when the shell does not supply one
fn default_provider(config: &AppConfig) -> Arc<dyn AudioResourceProvider> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "android")] {
            let _ = config;
            Arc::new(crate::audio::SilentProvider::new())
        } else {
            Arc::new(crate::audio::CpalProvider::new(config.audio.clone()))
        }
    }
}

/// Get the version of the metronome engine
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Mount the metronome with the platform's default audio provider
///
/// Loads the cue asset in the background and returns the idle status.
/// Mounting again replaces (and tears down) the current engine.
pub fn mount_metronome(config: AppConfig) -> Result<MetronomeStatus, ApiError> {
    mount_metronome_with_provider(default_provider(&config), config)
}

/// Mount the metronome with an explicit audio provider
pub fn mount_metronome_with_provider(
    provider: Arc<dyn AudioResourceProvider>,
    config: AppConfig,
) -> Result<MetronomeStatus, ApiError> {
    context()?.mount(provider, &config)
}

/// Tear down the mounted metronome
///
/// Returns `Ok(false)` when nothing was mounted.
pub fn unmount_metronome() -> Result<bool, ApiError> {
    context()?.unmount()
}

pub fn metronome_start() -> Result<MetronomeStatus, ApiError> {
    context()?.start()
}

pub fn metronome_stop() -> Result<MetronomeStatus, ApiError> {
    context()?.stop()
}

/// Toggle playback; returns whether the metronome is now playing
pub fn metronome_toggle() -> Result<bool, ApiError> {
    context()?.toggle()
}

/// Set the tempo
///
/// A running metronome is halted; the shell restarts it explicitly.
///
/// # Errors
/// - `ApiError::Tempo` when `bpm` is not one of [`metronome_tempo_options`]
/// - `ApiError::NotMounted` before `mount_metronome`
pub fn metronome_set_tempo(bpm: u32) -> Result<MetronomeStatus, ApiError> {
    context()?.set_tempo(bpm)
}

pub fn metronome_status() -> Result<MetronomeStatus, ApiError> {
    context()?.status()
}

/// Every selectable tempo, slowest first
pub fn metronome_tempo_options() -> Vec<TempoOption> {
    Tempo::all().map(TempoOption::from).collect()
}
