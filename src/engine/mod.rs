//! Engine module housing the metronome core.
//!
//! `tempo` validates BPM values, `schedule` owns the recurring cue timer and
//! `core` ties both to an audio provider behind the start/stop/tempo API.

pub mod core;
pub mod schedule;
pub mod tempo;

pub use self::core::{MetronomeEngine, MetronomeStatus, PlaybackState};
pub use schedule::ScheduleHandle;
pub use tempo::Tempo;
