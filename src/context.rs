// AppContext: Dependency Injection Container
// Holds the mounted metronome engine behind the process-global API

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::audio::AudioResourceProvider;
use crate::config::AppConfig;
use crate::engine::{MetronomeEngine, MetronomeStatus};
use crate::error::{log_api_error, ApiError};
use crate::telemetry::MetronomeEvent;

/// AppContext: owns at most one mounted [`MetronomeEngine`]
///
/// Mirrors a UI component lifecycle: `mount` builds and initializes an engine,
/// `unmount` tears it down. Every other operation forwards to the mounted
/// engine or fails with [`ApiError::NotMounted`].
pub struct AppContext {
    runtime: Handle,
    engine: Mutex<Option<Arc<MetronomeEngine>>>,
}

impl AppContext {
    /// Create an empty context whose engines run on `runtime`
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            engine: Mutex::new(None),
        }
    }

    // ========================================================================
    // LOCK HELPER METHODS
    // ========================================================================

    fn lock_engine(&self) -> Result<MutexGuard<'_, Option<Arc<MetronomeEngine>>>, ApiError> {
        self.engine.lock().map_err(|_| ApiError::LockPoisoned {
            component: "mounted_engine".to_string(),
        })
    }

    /// Clone the mounted engine out of the slot so the lock is not held
    /// while the engine does its own locking.
    fn engine(&self, context: &str) -> Result<Arc<MetronomeEngine>, ApiError> {
        let guard = self.lock_engine().map_err(|err| {
            log_api_error(&err, context);
            err
        })?;
        guard.as_ref().map(Arc::clone).ok_or_else(|| {
            let err = ApiError::NotMounted;
            log_api_error(&err, context);
            err
        })
    }

    // ========================================================================
    // LIFECYCLE METHODS
    // ========================================================================

    /// Build, initialize and store a new engine
    ///
    /// A previously mounted engine is torn down first, so the old schedule and
    /// audio handle never outlive the replacement.
    pub fn mount(
        &self,
        provider: Arc<dyn AudioResourceProvider>,
        config: &AppConfig,
    ) -> Result<MetronomeStatus, ApiError> {
        let engine = Arc::new(MetronomeEngine::with_runtime(
            self.runtime.clone(),
            provider,
            config,
        ));
        engine.initialize();
        let status = engine.status();

        let previous = {
            let mut guard = self.lock_engine().map_err(|err| {
                log_api_error(&err, "mount");
                err
            })?;
            guard.replace(engine)
        };
        if let Some(previous) = previous {
            log::info!("[AppContext] Replacing mounted metronome");
            previous.teardown();
        }

        log::info!("[AppContext] Metronome mounted at {} BPM", status.tempo_bpm);
        Ok(status)
    }

    /// Tear down and forget the mounted engine
    ///
    /// Returns `false` when nothing was mounted.
    pub fn unmount(&self) -> Result<bool, ApiError> {
        let previous = {
            let mut guard = self.lock_engine().map_err(|err| {
                log_api_error(&err, "unmount");
                err
            })?;
            guard.take()
        };
        match previous {
            Some(engine) => {
                engine.teardown();
                log::info!("[AppContext] Metronome unmounted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.lock_engine().map(|g| g.is_some()).unwrap_or(false)
    }

    // ========================================================================
    // METRONOME METHODS
    // ========================================================================

    pub fn start(&self) -> Result<MetronomeStatus, ApiError> {
        let engine = self.engine("start")?;
        engine.start();
        Ok(engine.status())
    }

    pub fn stop(&self) -> Result<MetronomeStatus, ApiError> {
        let engine = self.engine("stop")?;
        engine.stop();
        Ok(engine.status())
    }

    /// Returns whether the metronome is playing after the toggle
    pub fn toggle(&self) -> Result<bool, ApiError> {
        Ok(self.engine("toggle")?.toggle_start_stop())
    }

    pub fn set_tempo(&self, bpm: u32) -> Result<MetronomeStatus, ApiError> {
        let engine = self.engine("set_tempo")?;
        engine.set_tempo(bpm)?;
        Ok(engine.status())
    }

    pub fn status(&self) -> Result<MetronomeStatus, ApiError> {
        Ok(self.engine("status")?.status())
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<MetronomeEvent>, ApiError> {
        Ok(self.engine("subscribe")?.subscribe())
    }
}
