//! Metronome event types exposed to shells, the CLI and tests.

use serde::{Deserialize, Serialize};

/// Provider call that produced a failure event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioOperation {
    Load,
    Play,
    Stop,
    Release,
}

impl AudioOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioOperation::Load => "load",
            AudioOperation::Play => "play",
            AudioOperation::Stop => "stop",
            AudioOperation::Release => "release",
        }
    }
}

/// Lifecycle and cue events emitted by the metronome engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetronomeEvent {
    AssetLoaded {
        asset: String,
    },
    AssetLoadFailed {
        asset: String,
        reason: String,
    },
    Started {
        bpm: u32,
        period_ms: f64,
    },
    Stopped,
    TempoChanged {
        bpm: u32,
        halted: bool,
    },
    TempoRejected {
        bpm: u32,
        code: i32,
    },
    CueFired {
        beat: u64,
        audible: bool,
    },
    AudioCallFailed {
        operation: AudioOperation,
        code: i32,
    },
    TornDown,
}
