// Short Game Trainer Core - Practice Metronome Engine
// Tempo-paced audio cues with a fail-open audio provider

// Module declarations
pub mod api;
pub mod audio;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod telemetry;
pub mod testing;

// Re-exports for convenience
pub use api::*;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG` and defaults to `info`. Output goes to stderr so binaries
/// can keep stdout for JSON. `log` records from library code are
/// bridged into the subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Verify the public surface is reachable from the crate root
        let _ = engine::Tempo::MIN;
        let _ = config::AppConfig::default();
        let _ = error::ApiErrorCodes::NOT_MOUNTED;
        assert_eq!(metronome_tempo_options().len(), 6);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("[Test] logging initialized");
    }
}
