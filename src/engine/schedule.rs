//! Recurring cue schedule.
//!
//! A [`ScheduleHandle`] owns one tokio task ticking at a fixed period. Each
//! tick hands a play request to the provider and spawns it separately, so a
//! slow device call never delays the next beat.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::audio::{AudioHandle, AudioResourceProvider};
use crate::error::{log_audio_error, ErrorCode};
use crate::telemetry::{AudioOperation, EventCollector, MetronomeEvent};

/// Slot holding the engine's audio handle, shared with the schedule task.
pub(crate) type AudioSlot = Arc<RwLock<Option<AudioHandle>>>;

pub(crate) fn read_slot(slot: &AudioSlot) -> RwLockReadGuard<'_, Option<AudioHandle>> {
    slot.read().unwrap_or_else(PoisonError::into_inner)
}

fn lock_gate(gate: &Mutex<bool>) -> MutexGuard<'_, bool> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What a single tick does.
#[derive(Clone)]
pub(crate) struct CueAction {
    pub(crate) provider: Arc<dyn AudioResourceProvider>,
    pub(crate) audio: AudioSlot,
    pub(crate) events: Arc<EventCollector>,
}

impl CueAction {
    /// Dispatch one cue. A missing audio handle makes this a silent beat.
    fn fire(&self, beat: u64) {
        let play = read_slot(&self.audio)
            .as_ref()
            .map(|handle| self.provider.play(handle));

        self.events.publish(MetronomeEvent::CueFired {
            beat,
            audible: play.is_some(),
        });

        if let Some(play) = play {
            let events = Arc::clone(&self.events);
            tokio::spawn(async move {
                if let Err(err) = play.await {
                    log_audio_error(&err, "cue_fire");
                    events.publish(MetronomeEvent::AudioCallFailed {
                        operation: AudioOperation::Play,
                        code: err.code(),
                    });
                }
            });
        }
    }
}

/// Exclusively-owned handle to the running cue timer.
///
/// Dropping the handle disarms and aborts the timer task. The `armed` gate is
/// held while a tick dispatches, so disarming waits out a dispatch in progress
/// and no cue can slip out after cancellation returns.
pub struct ScheduleHandle {
    armed: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
    period: Duration,
}

impl ScheduleHandle {
    /// Start ticking every `period`, first tick one full period from now.
    ///
    /// The first deadline is taken at call time, not when the task is first
    /// polled, so a busy runtime cannot push the whole grid back.
    pub(crate) fn spawn(runtime: &Handle, period: Duration, cue: CueAction) -> Self {
        let armed = Arc::new(Mutex::new(true));
        let first_tick = Instant::now() + period;
        let task_armed = Arc::clone(&armed);

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut beat = 0u64;
            loop {
                ticker.tick().await;
                {
                    let armed = lock_gate(&task_armed);
                    if !*armed {
                        break;
                    }
                    beat += 1;
                    tracing::trace!(beat, "metronome cue");
                    cue.fire(beat);
                }
            }
            tracing::debug!(beats = beat, "metronome schedule finished");
        });

        Self {
            armed,
            task,
            period,
        }
    }

    fn is_armed(&self) -> bool {
        *lock_gate(&self.armed)
    }

    /// Cancel the timer; no cue is dispatched after this returns.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        *lock_gate(&self.armed) = false;
        self.task.abort();
    }
}

impl std::fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("period", &self.period)
            .field("armed", &self.is_armed())
            .finish()
    }
}
