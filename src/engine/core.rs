//! MetronomeEngine: playback state machine for the practice metronome.
//!
//! The engine owns the playing/idle state, the tempo, the cue schedule and
//! the audio handle. Every operation is synchronous for the caller: state
//! changes are applied under the state lock when the gesture arrives, and the
//! provider calls they trigger are spawned onto the runtime without being
//! awaited. Audio failures are logged and never change the state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::audio::{AssetRef, AudioFuture, AudioHandle, AudioResourceProvider};
use crate::config::{AppConfig, AudioModeConfig};
use crate::engine::schedule::{read_slot, AudioSlot, CueAction, ScheduleHandle};
use crate::engine::Tempo;
use crate::error::{log_audio_error, log_tempo_error, AudioError, ErrorCode, TempoError};
use crate::telemetry::{AudioOperation, EventCollector, EventSnapshot, MetronomeEvent};

/// Whether cues are being produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

/// Read model for the presentation shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetronomeStatus {
    pub tempo_bpm: u32,
    pub playing: bool,
    pub audio_loaded: bool,
    pub period_ms: f64,
}

struct EngineState {
    playback: PlaybackState,
    tempo: Tempo,
    schedule: Option<ScheduleHandle>,
    initialized: bool,
    torn_down: bool,
}

/// Metronome engine bound to one audio provider.
pub struct MetronomeEngine {
    runtime: Handle,
    provider: Arc<dyn AudioResourceProvider>,
    asset: AssetRef,
    mode: AudioModeConfig,
    state: Mutex<EngineState>,
    audio: AudioSlot,
    torn_down: Arc<AtomicBool>,
    events: Arc<EventCollector>,
}

impl MetronomeEngine {
    /// Create an engine on the current tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime; use [`MetronomeEngine::with_runtime`]
    /// to pass a handle explicitly.
    pub fn new(provider: Arc<dyn AudioResourceProvider>, config: &AppConfig) -> Self {
        Self::with_runtime(Handle::current(), provider, config)
    }

    pub fn with_runtime(
        runtime: Handle,
        provider: Arc<dyn AudioResourceProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            runtime,
            provider,
            asset: config.metronome.asset.clone(),
            mode: config.audio.mode,
            state: Mutex::new(EngineState {
                playback: PlaybackState::Idle,
                tempo: config.metronome.initial_tempo(),
                schedule: None,
                initialized: false,
                torn_down: false,
            }),
            audio: Arc::new(RwLock::new(None)),
            torn_down: Arc::new(AtomicBool::new(false)),
            events: Arc::new(EventCollector::from_config(&config.telemetry)),
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Request the cue asset from the provider (call once on mount).
    ///
    /// Returns immediately. On failure the engine stays usable but silent; the
    /// load is not retried. A handle that arrives after teardown is released
    /// straight away instead of being stored.
    pub fn initialize(&self) {
        let mut state = self.lock_state();
        if state.torn_down || state.initialized {
            log::debug!("[MetronomeEngine] initialize ignored (already initialized or torn down)");
            return;
        }
        state.initialized = true;

        let load = self.provider.load(&self.asset, self.mode);
        let provider = Arc::clone(&self.provider);
        let audio = Arc::clone(&self.audio);
        let torn_down = Arc::clone(&self.torn_down);
        let events = Arc::clone(&self.events);
        let asset = self.asset.to_string();

        log::info!("[MetronomeEngine] Loading cue asset {}", asset);
        self.runtime.spawn(async move {
            let handle = match load.await {
                Ok(handle) => handle,
                Err(err) => {
                    log_audio_error(&err, "initialize");
                    events.publish(MetronomeEvent::AssetLoadFailed {
                        asset,
                        reason: err.message(),
                    });
                    return;
                }
            };

            // Teardown raises the flag before it empties the slot, so checking
            // under the slot lock cannot strand a handle.
            let late = {
                let mut slot = write_slot(&audio);
                if torn_down.load(Ordering::SeqCst) {
                    Some(handle)
                } else {
                    *slot = Some(handle);
                    None
                }
            };

            match late {
                Some(handle) => {
                    log::info!("[MetronomeEngine] Cue loaded after teardown, releasing");
                    let release = provider.release(handle);
                    report_failure(release.await, AudioOperation::Release, &events);
                }
                None => {
                    log::info!("[MetronomeEngine] Cue asset {} ready", asset);
                    events.publish(MetronomeEvent::AssetLoaded { asset });
                }
            }
        });
    }

    /// Stop playback and release the audio handle (call once on unmount).
    ///
    /// Idempotent. Afterwards no timer is pending and no cue can fire.
    pub fn teardown(&self) {
        let mut state = self.lock_state();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        self.torn_down.store(true, Ordering::SeqCst);
        self.halt(&mut state);
        drop(state);

        let handle = write_slot(&self.audio).take();
        if let Some(handle) = handle {
            let release = self.provider.release(handle);
            self.dispatch(release, AudioOperation::Release);
        }

        log::info!("[MetronomeEngine] Torn down");
        self.events.publish(MetronomeEvent::TornDown);
    }

    // ========================================================================
    // TRANSPORT
    // ========================================================================

    /// Begin producing cues at the current tempo. No-op while playing.
    ///
    /// The first cue sounds one full period after this call.
    pub fn start(&self) {
        let mut state = self.lock_state();
        self.start_locked(&mut state);
    }

    /// Stop producing cues. No-op while idle.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        self.halt(&mut state);
    }

    /// `stop()` if playing, else `start()`. Returns whether the metronome is now playing.
    pub fn toggle_start_stop(&self) -> bool {
        let mut state = self.lock_state();
        match state.playback {
            PlaybackState::Playing => {
                self.halt(&mut state);
            }
            PlaybackState::Idle => self.start_locked(&mut state),
        }
        state.playback == PlaybackState::Playing
    }

    /// Store a new tempo. Changing tempo while playing halts playback.
    ///
    /// # Errors
    /// Out-of-domain values are rejected and leave the engine untouched.
    pub fn set_tempo(&self, bpm: u32) -> Result<Tempo, TempoError> {
        let tempo = Tempo::new(bpm).map_err(|err| {
            log_tempo_error(&err, "set_tempo");
            self.events.publish(MetronomeEvent::TempoRejected {
                bpm,
                code: err.code(),
            });
            err
        })?;

        let mut state = self.lock_state();
        state.tempo = tempo;
        let halted = self.halt(&mut state);

        log::info!(
            "[MetronomeEngine] Tempo set to {}{}",
            tempo,
            if halted { " (playback halted)" } else { "" }
        );
        self.events.publish(MetronomeEvent::TempoChanged {
            bpm: tempo.bpm(),
            halted,
        });
        Ok(tempo)
    }

    // ========================================================================
    // READ MODEL
    // ========================================================================

    pub fn current_tempo(&self) -> Tempo {
        self.lock_state().tempo
    }

    pub fn is_playing(&self) -> bool {
        self.lock_state().playback == PlaybackState::Playing
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.lock_state().playback
    }

    pub fn has_audio(&self) -> bool {
        read_slot(&self.audio).is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> MetronomeStatus {
        let (tempo, playing) = {
            let state = self.lock_state();
            (state.tempo, state.playback == PlaybackState::Playing)
        };
        MetronomeStatus {
            tempo_bpm: tempo.bpm(),
            playing,
            audio_loaded: self.has_audio(),
            period_ms: tempo.period().as_secs_f64() * 1000.0,
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<MetronomeEvent> {
        self.events.subscribe()
    }

    pub fn event_snapshot(&self) -> EventSnapshot {
        self.events.snapshot()
    }

    // ========================================================================
    // PRIVATE HELPERS
    // ========================================================================

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            let err = AudioError::LockPoisoned {
                component: "metronome_state".to_string(),
            };
            log_audio_error(&err, "lock_state");
            poisoned.into_inner()
        })
    }

    fn start_locked(&self, state: &mut EngineState) {
        if state.torn_down {
            log::warn!("[MetronomeEngine] start ignored: engine torn down");
            return;
        }
        if state.playback == PlaybackState::Playing {
            log::debug!("[MetronomeEngine] start ignored: already playing");
            return;
        }
        debug_assert!(state.schedule.is_none(), "idle engine must not hold a schedule");

        let period = state.tempo.period();
        state.schedule = Some(ScheduleHandle::spawn(&self.runtime, period, self.cue_action()));
        state.playback = PlaybackState::Playing;

        log::info!(
            "[MetronomeEngine] Started at {} (period {:?})",
            state.tempo,
            period
        );
        self.events.publish(MetronomeEvent::Started {
            bpm: state.tempo.bpm(),
            period_ms: period.as_secs_f64() * 1000.0,
        });
    }

    /// Cancel the schedule and stop in-flight audio. Returns whether playback was running.
    fn halt(&self, state: &mut EngineState) -> bool {
        if state.playback != PlaybackState::Playing {
            return false;
        }

        if let Some(schedule) = state.schedule.take() {
            schedule.cancel();
        }
        state.playback = PlaybackState::Idle;

        let stop = read_slot(&self.audio)
            .as_ref()
            .map(|handle| self.provider.stop(handle));
        if let Some(stop) = stop {
            self.dispatch(stop, AudioOperation::Stop);
        }

        log::info!("[MetronomeEngine] Stopped");
        self.events.publish(MetronomeEvent::Stopped);
        true
    }

    fn cue_action(&self) -> CueAction {
        CueAction {
            provider: Arc::clone(&self.provider),
            audio: Arc::clone(&self.audio),
            events: Arc::clone(&self.events),
        }
    }

    /// Fire-and-forget a provider call, logging any failure.
    fn dispatch(&self, call: AudioFuture<()>, operation: AudioOperation) {
        let events = Arc::clone(&self.events);
        self.runtime.spawn(async move {
            report_failure(call.await, operation, &events);
        });
    }
}

impl Drop for MetronomeEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn write_slot(slot: &AudioSlot) -> RwLockWriteGuard<'_, Option<AudioHandle>> {
    slot.write().unwrap_or_else(PoisonError::into_inner)
}

fn report_failure(result: Result<(), AudioError>, operation: AudioOperation, events: &EventCollector) {
    if let Err(err) = result {
        log_audio_error(&err, operation.as_str());
        events.publish(MetronomeEvent::AudioCallFailed {
            operation,
            code: err.code(),
        });
    }
}
