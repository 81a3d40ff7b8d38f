use futures::{future, Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::error::ApiError;
use crate::telemetry::MetronomeEvent;

use super::context;

/// Stream of engine events for the mounted metronome
///
/// Emits lifecycle events (start/stop, tempo changes, cues, audio failures).
/// Events missed by a slow consumer are skipped. The stream ends when the
/// engine is unmounted and its event channel closes.
pub fn metronome_event_stream() -> Result<impl Stream<Item = MetronomeEvent> + Send, ApiError> {
    let receiver = context()?.subscribe()?;
    Ok(BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(event) => future::ready(Some(event)),
        Err(err) => {
            log::warn!("[MetronomeApi] Event stream lagged: {}", err);
            future::ready(None)
        }
    }))
}
