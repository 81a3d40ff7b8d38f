//! CPAL-based audio provider for desktop platforms (Linux, macOS, Windows)
//!
//! One output stream is opened lazily on the first `load` and lives on a
//! dedicated thread, since `cpal::Stream` is not `Send` on every host. Each
//! loaded cue becomes a [`Voice`] whose playback position is a single atomic
//! cursor: `play` rewinds it to zero, `stop` parks it at the end. Handles
//! resolve to voices through a cache kept beside the mixer, so `play` and
//! `stop` never touch the lock the audio callback takes. The callback never
//! blocks; if a load or release is editing the voice table it outputs
//! silence for that buffer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, RwLock};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use futures::future;

use super::asset::{AssetRef, ClickSample};
use super::provider::{AudioFuture, AudioHandle, AudioResourceProvider};
use crate::config::{AudioConfig, AudioModeConfig};
use crate::error::AudioError;

/// A loaded cue and its playback position.
struct Voice {
    samples: Vec<f32>,
    cursor: AtomicUsize,
}

impl Voice {
    /// New voices start parked (silent) until the first `play`.
    fn new(samples: Vec<f32>) -> Self {
        let len = samples.len();
        Self {
            samples,
            cursor: AtomicUsize::new(len),
        }
    }

    fn rewind(&self) {
        self.cursor.store(0, Ordering::Release);
    }

    fn silence(&self) {
        self.cursor.store(self.samples.len(), Ordering::Release);
    }

    #[cfg(test)]
    fn is_sounding(&self) -> bool {
        self.cursor.load(Ordering::Acquire) < self.samples.len()
    }

    /// Add the next block of this voice into an interleaved output buffer.
    ///
    /// The cursor only advances if nobody rewound it meanwhile, so a `play`
    /// issued during rendering always restarts the cue.
    fn mix_into(&self, out: &mut [f32], channels: usize) {
        let start = self.cursor.load(Ordering::Acquire);
        let len = self.samples.len();
        if start >= len || channels == 0 {
            return;
        }

        let frames = out.len() / channels;
        let end = (start + frames).min(len);
        for (frame, &sample) in out.chunks_mut(channels).zip(&self.samples[start..end]) {
            for slot in frame {
                *slot += sample;
            }
        }

        let _ = self
            .cursor
            .compare_exchange(start, end, Ordering::AcqRel, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct Mixer {
    voices: Mutex<HashMap<u64, Arc<Voice>>>,
}

impl Mixer {
    fn render(&self, out: &mut [f32], channels: usize) {
        out.fill(0.0);
        let Ok(voices) = self.voices.try_lock() else {
            return;
        };
        for voice in voices.values() {
            voice.mix_into(out, channels);
        }
        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

/// Output stream owner thread.
struct OutputThread {
    sample_rate: u32,
    shutdown: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl OutputThread {
    fn spawn(mixer: Arc<Mixer>) -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, AudioError>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("metronome-output".to_string())
            .spawn(move || {
                let stream = match open_output_stream(mixer) {
                    Ok((stream, sample_rate)) => {
                        let _ = ready_tx.send(Ok(sample_rate));
                        stream
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                // Park until the provider goes away; the stream stops on drop.
                let _ = shutdown_rx.recv();
                drop(stream);
                log::debug!("[CpalProvider] Output stream closed");
            })
            .map_err(|err| AudioError::DeviceUnavailable {
                reason: format!("failed to spawn output thread: {}", err),
            })?;

        let sample_rate = ready_rx.recv().map_err(|_| AudioError::DeviceUnavailable {
            reason: "output thread exited before reporting".to_string(),
        })??;

        log::info!("[CpalProvider] Output stream open at {} Hz", sample_rate);

        Ok(Self {
            sample_rate,
            shutdown: shutdown_tx,
            thread: Some(thread),
        })
    }
}

impl Drop for OutputThread {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn open_output_stream(mixer: Arc<Mixer>) -> Result<(cpal::Stream, u32), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable {
            reason: "No default output device found".to_string(),
        })?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceUnavailable {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    let sample_rate = config.sample_rate().0;
    let stream_config: cpal::StreamConfig = config.clone().into();
    let channels = stream_config.channels as usize;

    let err_fn = |err| log::error!("[CpalProvider] Output stream error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                mixer.render(data, channels);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(AudioError::DeviceUnavailable {
                reason: format!("Unsupported output sample format {:?}", other),
            })
        }
    }
    .map_err(|e| AudioError::DeviceUnavailable {
        reason: format!("{:?}", e),
    })?;

    stream.play().map_err(|e| AudioError::DeviceUnavailable {
        reason: format!("Failed to start output stream: {:?}", e),
    })?;

    Ok((stream, sample_rate))
}

struct Inner {
    mixer: Arc<Mixer>,
    output: Mutex<Option<OutputThread>>,
    /// Handle id to voice, read by `play`/`stop`
    handles: RwLock<HashMap<u64, Arc<Voice>>>,
    next_id: AtomicU64,
    audio: AudioConfig,
}

impl Inner {
    fn lock_output(&self) -> Result<MutexGuard<'_, Option<OutputThread>>, AudioError> {
        self.output.lock().map_err(|_| AudioError::LockPoisoned {
            component: "cpal_output".to_string(),
        })
    }

    fn lock_voices(&self) -> Result<MutexGuard<'_, HashMap<u64, Arc<Voice>>>, AudioError> {
        self.mixer.voices.lock().map_err(|_| AudioError::LockPoisoned {
            component: "cpal_voices".to_string(),
        })
    }

    fn ensure_output(&self) -> Result<u32, AudioError> {
        let mut output = self.lock_output()?;
        if let Some(thread) = output.as_ref() {
            return Ok(thread.sample_rate);
        }
        let thread = OutputThread::spawn(Arc::clone(&self.mixer))?;
        let sample_rate = thread.sample_rate;
        *output = Some(thread);
        Ok(sample_rate)
    }

    fn load_blocking(&self, asset: &AssetRef, mode: AudioModeConfig) -> Result<AudioHandle, AudioError> {
        log::debug!(
            "[CpalProvider] Loading {} with {:?} (session flags are advisory on desktop)",
            asset,
            mode
        );
        let click = ClickSample::resolve(
            asset,
            self.audio.click_sample_rate,
            self.audio.click_duration_ms,
        )?;
        let device_rate = self.ensure_output()?;
        let click = click.resampled(device_rate);
        self.register_voice(click.samples)
    }

    fn register_voice(&self, samples: Vec<f32>) -> Result<AudioHandle, AudioError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let voice = Arc::new(Voice::new(samples));
        self.handles
            .write()
            .map_err(|_| AudioError::LockPoisoned {
                component: "cpal_handles".to_string(),
            })?
            .insert(id, Arc::clone(&voice));
        self.lock_voices()?.insert(id, voice);
        Ok(AudioHandle::new(id))
    }

    fn voice(&self, id: u64) -> Result<Arc<Voice>, AudioError> {
        self.handles
            .read()
            .map_err(|_| AudioError::LockPoisoned {
                component: "cpal_handles".to_string(),
            })?
            .get(&id)
            .cloned()
            .ok_or(AudioError::HandleReleased)
    }

    fn unregister_voice(&self, id: u64) -> Result<(), AudioError> {
        self.handles
            .write()
            .map_err(|_| AudioError::LockPoisoned {
                component: "cpal_handles".to_string(),
            })?
            .remove(&id);
        self.lock_voices()?.remove(&id);
        Ok(())
    }
}

/// Desktop provider playing cues through the default output device.
pub struct CpalProvider {
    inner: Arc<Inner>,
}

impl CpalProvider {
    pub fn new(audio: AudioConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                mixer: Arc::new(Mixer::default()),
                output: Mutex::new(None),
                handles: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                audio: audio.clamped(),
            }),
        }
    }
}

impl Default for CpalProvider {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}

impl AudioResourceProvider for CpalProvider {
    fn load(&self, asset: &AssetRef, mode: AudioModeConfig) -> AudioFuture<AudioHandle> {
        let inner = Arc::clone(&self.inner);
        let asset = asset.clone();
        let label = asset.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || inner.load_blocking(&asset, mode))
                .await
                .map_err(|err| AudioError::AssetLoadFailed {
                    asset: label,
                    reason: err.to_string(),
                })?
        })
    }

    fn play(&self, handle: &AudioHandle) -> AudioFuture<()> {
        let result = self.inner.voice(handle.id()).map(|voice| voice.rewind());
        Box::pin(future::ready(result))
    }

    fn stop(&self, handle: &AudioHandle) -> AudioFuture<()> {
        let result = match self.inner.voice(handle.id()) {
            Ok(voice) => {
                voice.silence();
                Ok(())
            }
            Err(AudioError::HandleReleased) => Ok(()),
            Err(err) => Err(err),
        };
        Box::pin(future::ready(result))
    }

    fn release(&self, handle: AudioHandle) -> AudioFuture<()> {
        Box::pin(future::ready(self.inner.unregister_voice(handle.id())))
    }
}
