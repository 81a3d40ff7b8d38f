// Integration tests for the metronome engine's cue cadence and resource lifecycle
//
// Cadence tests run on a paused tokio clock: sleeping auto-advances time to
// the next timer, so cadence assertions are exact and run instantly. The
// cross-thread cancellation test runs on real time with two workers.

use std::sync::Arc;
use std::time::Duration;

use short_game_trainer::config::AppConfig;
use short_game_trainer::engine::{MetronomeEngine, Tempo};
use short_game_trainer::telemetry::{AudioOperation, MetronomeEvent};
use short_game_trainer::testing::{settle, RecordingProvider};
use tokio::time::{sleep, Instant};

fn engine_with(provider: &RecordingProvider) -> MetronomeEngine {
    MetronomeEngine::new(Arc::new(provider.clone()), &AppConfig::default())
}

async fn loaded_engine(provider: &RecordingProvider) -> MetronomeEngine {
    let engine = engine_with(provider);
    engine.initialize();
    settle().await;
    engine
}

async fn wait(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
    settle().await;
}

fn close_to(actual: Duration, expected: Duration) -> bool {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    diff <= Duration::from_millis(1)
}

fn assert_spacing(times: &[Instant], expected: Duration) {
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            close_to(gap, expected),
            "cue spacing {:?} differs from {:?}",
            gap,
            expected
        );
    }
}

/// start() at 60 BPM: one cue after 1000 ms, three after 3000 ms, 1000 ms apart
#[tokio::test(start_paused = true)]
async fn test_cues_follow_period_at_60_bpm() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;
    let started = Instant::now();

    engine.start();
    settle().await;
    assert_eq!(provider.play_count(), 0, "no cue on start");

    wait(999).await;
    assert_eq!(provider.play_count(), 0, "no cue before one full period");

    wait(1).await;
    assert_eq!(provider.play_count(), 1);

    wait(2000).await;
    assert_eq!(provider.play_count(), 3);

    let times = provider.play_times();
    let first_gap = times[0] - started;
    assert!(close_to(first_gap, Duration::from_millis(1000)));
    assert_spacing(&times, Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_cadence_uses_tempo_at_start() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    engine.set_tempo(120).unwrap();
    engine.start();
    wait(2000).await;

    assert_eq!(provider.play_count(), 4);
    assert_spacing(&provider.play_times(), Duration::from_millis(500));
}

/// start() twice in a row yields a single schedule's cadence
#[tokio::test(start_paused = true)]
async fn test_double_start_keeps_single_schedule() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    engine.start();
    engine.start();
    wait(3000).await;

    assert_eq!(provider.play_count(), 3);
    assert_spacing(&provider.play_times(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_gestures_never_duplicate_schedule() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    for _ in 0..5 {
        engine.start();
        engine.stop();
        engine.start();
        engine.start();
    }
    assert!(engine.is_playing());
    wait(3000).await;

    assert_eq!(provider.play_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_start_stop_parity() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    let sequences: [&[bool]; 4] = [
        &[true, true, false],
        &[true, false, false, true],
        &[false, false],
        &[true, true, true, false, true],
    ];
    for sequence in sequences {
        for &start in sequence {
            if start {
                engine.start();
            } else {
                engine.stop();
            }
        }
        let expected = *sequence.last().unwrap_or(&false);
        assert_eq!(engine.is_playing(), expected, "sequence {:?}", sequence);
        engine.stop();
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_further_cues() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    engine.start();
    wait(2000).await;
    engine.stop();
    let fired = provider.play_count();
    wait(5000).await;

    assert_eq!(provider.play_count(), fired);
    assert_eq!(fired, 2);
}

/// Teardown on a deadline: whatever fired before teardown returned is all that ever fires
#[tokio::test(start_paused = true)]
async fn test_no_cue_after_teardown_even_if_tick_pending() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    engine.start();
    sleep(Duration::from_millis(1000)).await;
    let before = provider.play_count();
    engine.teardown();
    wait(5000).await;

    assert!(before <= 1);
    assert_eq!(provider.play_count(), before);
    assert_eq!(provider.release_count(), 1);
    assert_eq!(provider.live_handles(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tempo_change_halts_running_schedule() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    engine.start();
    wait(1500).await;
    assert_eq!(provider.play_count(), 1);

    engine.set_tempo(96).unwrap();
    assert!(!engine.is_playing());
    wait(5000).await;

    assert_eq!(provider.play_count(), 1);
    assert_eq!(provider.stop_count(), 1);

    // Restart picks up the new period.
    engine.start();
    wait(1250).await;
    assert_eq!(provider.play_count(), 3);
}

/// Load failure: start still plays silently and stop still returns to idle
#[tokio::test(start_paused = true)]
async fn test_load_failure_runs_silent() {
    let provider = RecordingProvider::new().failing_load();
    let engine = loaded_engine(&provider).await;
    assert!(!engine.has_audio());

    engine.start();
    assert!(engine.is_playing());
    wait(3000).await;
    assert_eq!(provider.play_count(), 0);

    engine.stop();
    assert!(!engine.is_playing());
    settle().await;
    assert_eq!(provider.stop_count(), 0);

    let snapshot = engine.event_snapshot();
    assert!(snapshot
        .recent
        .iter()
        .any(|e| matches!(e, MetronomeEvent::AssetLoadFailed { .. })));
    let silent_beats = snapshot
        .recent
        .iter()
        .filter(|e| matches!(e, MetronomeEvent::CueFired { audible: false, .. }))
        .count();
    assert_eq!(silent_beats, 3);
}

#[tokio::test(start_paused = true)]
async fn test_play_failures_do_not_stop_schedule() {
    let provider = RecordingProvider::new().failing_play();
    let engine = loaded_engine(&provider).await;

    engine.start();
    wait(3000).await;

    assert!(engine.is_playing());
    assert_eq!(provider.play_count(), 3);
    let failures = engine
        .event_snapshot()
        .recent
        .iter()
        .filter(|e| {
            matches!(
                e,
                MetronomeEvent::AudioCallFailed {
                    operation: AudioOperation::Play,
                    ..
                }
            )
        })
        .count();
    assert_eq!(failures, 3);
}

#[tokio::test(start_paused = true)]
async fn test_slow_play_does_not_delay_next_cue() {
    let provider = RecordingProvider::new().with_play_delay(Duration::from_secs(5));
    let engine = loaded_engine(&provider).await;

    engine.start();
    wait(3000).await;

    assert_eq!(provider.play_count(), 3);
    assert_spacing(&provider.play_times(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_audio_arriving_mid_playback_is_used() {
    let provider = RecordingProvider::new().with_load_delay(Duration::from_millis(1500));
    let engine = engine_with(&provider);
    engine.initialize();

    engine.start();
    wait(3000).await;

    // Beat 1 was silent, beats 2 and 3 found the handle.
    assert_eq!(provider.play_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_load_completing_after_teardown_is_released() {
    let provider = RecordingProvider::new().with_load_delay(Duration::from_secs(2));
    let engine = engine_with(&provider);
    engine.initialize();
    engine.teardown();

    wait(3000).await;

    assert!(!engine.has_audio());
    assert_eq!(provider.release_count(), 1);
    assert_eq!(provider.live_handles(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_every_tempo_has_expected_period() {
    let provider = RecordingProvider::new();
    let engine = loaded_engine(&provider).await;

    for tempo in Tempo::all() {
        engine.set_tempo(tempo.bpm()).unwrap();
        let status = engine.status();
        assert!(!status.playing);
        assert!((status.period_ms - 60_000.0 / tempo.bpm() as f64).abs() < 1e-6);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_from_another_thread_freezes_cues() {
    let provider = RecordingProvider::new();
    let engine = Arc::new(engine_with(&provider));
    let period = Tempo::new(120).unwrap().period();
    const ROUNDS: usize = 3;

    let run = async {
        engine.initialize();
        while !engine.has_audio() {
            sleep(Duration::from_millis(1)).await;
        }
        engine.set_tempo(120).unwrap();

        for round in 0..ROUNDS {
            engine.start();
            // Land the cancel on a tick deadline so it races the dispatch.
            sleep(period * 2).await;

            let stopper = Arc::clone(&engine);
            let counter = provider.clone();
            let last = round + 1 == ROUNDS;
            let frozen = tokio::task::spawn_blocking(move || {
                if last {
                    stopper.teardown();
                } else {
                    stopper.stop();
                }
                counter.play_count()
            })
            .await
            .unwrap();

            sleep(period + Duration::from_millis(100)).await;
            assert_eq!(
                provider.play_count(),
                frozen,
                "cue dispatched after cancel returned in round {}",
                round
            );
        }
    };

    tokio::time::timeout(Duration::from_secs(20), run)
        .await
        .expect("stop/teardown did not finish");
    assert!(provider.play_count() > 0);
    assert!(!engine.is_playing());
    assert_eq!(provider.release_count(), 1);
}
