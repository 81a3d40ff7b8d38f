//! Audio resource provider abstraction.
//!
//! The metronome engine never touches an audio device directly. It asks a
//! provider to load the cue once, then to play, stop and finally release it.
//! Every call returns a pending outcome; the engine treats all of them as
//! best-effort side effects.

use futures::future::{self, BoxFuture};

use super::asset::AssetRef;
use crate::config::AudioModeConfig;
use crate::error::AudioError;

/// Pending outcome of a provider call.
pub type AudioFuture<T> = BoxFuture<'static, Result<T, AudioError>>;

/// Opaque, exclusively-owned reference to a loaded sound.
///
/// Not `Clone`: the engine holds the only handle and gives it back through
/// [`AudioResourceProvider::release`], so a sound cannot be released twice.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AudioHandle {
    id: u64,
}

impl AudioHandle {
    /// Providers mint handles from their own id space.
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Trait implemented by platform audio layers.
///
/// Calls only borrow the handle; implementations must not hold on to the
/// borrow inside the returned future.
pub trait AudioResourceProvider: Send + Sync {
    /// Load `asset` into a playable handle.
    fn load(&self, asset: &AssetRef, mode: AudioModeConfig) -> AudioFuture<AudioHandle>;

    /// Play from the beginning, rewinding if the sound is already playing.
    fn play(&self, handle: &AudioHandle) -> AudioFuture<()>;

    /// Stop any in-flight playback.
    fn stop(&self, handle: &AudioHandle) -> AudioFuture<()>;

    /// Release the sound. Releasing an unknown handle succeeds.
    fn release(&self, handle: AudioHandle) -> AudioFuture<()>;
}

/// Provider with no output device; every call succeeds and does nothing.
#[derive(Debug, Default)]
pub struct SilentProvider {
    next_id: std::sync::atomic::AtomicU64,
}

impl SilentProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioResourceProvider for SilentProvider {
    fn load(&self, asset: &AssetRef, _mode: AudioModeConfig) -> AudioFuture<AudioHandle> {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        log::debug!("[SilentProvider] load {} -> handle {}", asset, id);
        Box::pin(future::ready(Ok(AudioHandle::new(id))))
    }

    fn play(&self, _handle: &AudioHandle) -> AudioFuture<()> {
        Box::pin(future::ready(Ok(())))
    }

    fn stop(&self, _handle: &AudioHandle) -> AudioFuture<()> {
        Box::pin(future::ready(Ok(())))
    }

    fn release(&self, _handle: AudioHandle) -> AudioFuture<()> {
        Box::pin(future::ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_silent_provider_hands_out_distinct_handles() {
        let provider = SilentProvider::new();
        let mode = AudioModeConfig::default();
        let a = block_on(provider.load(&AssetRef::Builtin, mode)).unwrap();
        let b = block_on(provider.load(&AssetRef::Builtin, mode)).unwrap();
        assert_ne!(a.id(), b.id());

        assert!(block_on(provider.play(&a)).is_ok());
        assert!(block_on(provider.stop(&a)).is_ok());
        assert!(block_on(provider.release(a)).is_ok());
        assert!(block_on(provider.release(b)).is_ok());
    }
}
