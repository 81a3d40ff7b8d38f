//! Recording audio provider for deterministic engine tests.
//!
//! Every call is logged with the tokio clock reading at the moment the engine
//! made it, so tests running on a paused clock can assert exact cue cadence.
//! Failures and latency are injected through builder methods.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::audio::{AssetRef, AudioFuture, AudioHandle, AudioResourceProvider};
use crate::config::AudioModeConfig;
use crate::error::AudioError;

/// Provider method invoked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCall {
    Load,
    Play(u64),
    Stop(u64),
    Release(u64),
}

#[derive(Debug, Clone, Copy)]
pub struct RecordedCall {
    pub call: ProviderCall,
    pub at: Instant,
}

#[derive(Default)]
struct Journal {
    calls: Vec<RecordedCall>,
    live: HashSet<u64>,
    last_mode: Option<AudioModeConfig>,
}

/// Provider double that records calls instead of producing sound.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    journal: Arc<Mutex<Journal>>,
    next_id: Arc<AtomicU64>,
    fail_load: bool,
    fail_play: bool,
    load_delay: Duration,
    play_delay: Duration,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `load` resolves to `AssetLoadFailed`.
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Every `play` resolves to `PlaybackFailed`.
    pub fn failing_play(mut self) -> Self {
        self.fail_play = true;
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_play_delay(mut self, delay: Duration) -> Self {
        self.play_delay = delay;
        self
    }

    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: ProviderCall) {
        self.journal().calls.push(RecordedCall {
            call,
            at: Instant::now(),
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.journal().calls.clone()
    }

    fn count(&self, matches: impl Fn(&ProviderCall) -> bool) -> usize {
        self.journal().calls.iter().filter(|c| matches(&c.call)).count()
    }

    pub fn load_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Load))
    }

    pub fn play_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Play(_)))
    }

    pub fn stop_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Stop(_)))
    }

    pub fn release_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Release(_)))
    }

    /// Clock readings of every `play` dispatch, in order.
    pub fn play_times(&self) -> Vec<Instant> {
        self.journal()
            .calls
            .iter()
            .filter(|c| matches!(c.call, ProviderCall::Play(_)))
            .map(|c| c.at)
            .collect()
    }

    /// Handles loaded and not yet released.
    pub fn live_handles(&self) -> usize {
        self.journal().live.len()
    }

    pub fn last_mode(&self) -> Option<AudioModeConfig> {
        self.journal().last_mode
    }
}

impl AudioResourceProvider for RecordingProvider {
    fn load(&self, _asset: &AssetRef, mode: AudioModeConfig) -> AudioFuture<AudioHandle> {
        self.record(ProviderCall::Load);
        self.journal().last_mode = Some(mode);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let journal = Arc::clone(&self.journal);
        let fail = self.fail_load;
        let delay = self.load_delay;

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(AudioError::AssetLoadFailed {
                    asset: "recording".to_string(),
                    reason: "simulated load failure".to_string(),
                });
            }
            journal
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .live
                .insert(id);
            Ok(AudioHandle::new(id))
        })
    }

    fn play(&self, handle: &AudioHandle) -> AudioFuture<()> {
        self.record(ProviderCall::Play(handle.id()));
        let fail = self.fail_play;
        let delay = self.play_delay;

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(AudioError::playback("play", "simulated device rejection"));
            }
            Ok(())
        })
    }

    fn stop(&self, handle: &AudioHandle) -> AudioFuture<()> {
        self.record(ProviderCall::Stop(handle.id()));
        Box::pin(futures::future::ready(Ok(())))
    }

    fn release(&self, handle: AudioHandle) -> AudioFuture<()> {
        self.record(ProviderCall::Release(handle.id()));
        self.journal().live.remove(&handle.id());
        Box::pin(futures::future::ready(Ok(())))
    }
}
