//! Metronome event collector.
//!
//! The collector fans engine events out over a tokio broadcast channel and
//! keeps a bounded history so a shell that subscribes late can still render
//! the latest state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::config::{TelemetryConfig, MAX_EVENT_CHANNEL_CAPACITY, MAX_EVENT_HISTORY};

pub mod events;

pub use events::{AudioOperation, MetronomeEvent};

/// Snapshot of collector state for shell/CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventSnapshot {
    pub recent: Vec<MetronomeEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct EventCollector {
    tx: broadcast::Sender<MetronomeEvent>,
    history: Mutex<VecDeque<MetronomeEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl EventCollector {
    /// Capacities are clamped to `MAX_EVENT_CHANNEL_CAPACITY` and `MAX_EVENT_HISTORY`.
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.clamp(1, MAX_EVENT_CHANNEL_CAPACITY));
        let history_capacity = history_capacity.min(MAX_EVENT_HISTORY);
        Self {
            tx,
            history: Mutex::new(VecDeque::new()),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.channel_capacity, config.history_capacity)
    }

    fn lock_history(&self) -> MutexGuard<'_, VecDeque<MetronomeEvent>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, event: MetronomeEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if self.history_capacity > 0 {
            let mut history = self.lock_history();
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is the normal case when no shell is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetronomeEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> EventSnapshot {
        let history = self.lock_history();
        EventSnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}
