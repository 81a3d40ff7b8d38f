use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_metronome_cli"))
}

fn stdout_lines(output: &std::process::Output) -> Vec<Value> {
    String::from_utf8(output.stdout.clone())
        .expect("stdout UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect()
}

#[test]
fn tempos_lists_domain() {
    let output = cli()
        .arg("tempos")
        .output()
        .expect("failed to run metronome_cli tempos");
    assert!(output.status.success());

    let tempos = stdout_lines(&output);
    let bpms: Vec<u64> = tempos.iter().filter_map(|t| t["bpm"].as_u64()).collect();
    assert_eq!(bpms, vec![60, 72, 84, 96, 108, 120]);
    assert_eq!(tempos[3]["period_ms"].as_f64(), Some(625.0));
}

#[test]
fn write_click_renders_wav() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("click.wav");

    let output = cli()
        .args(["write-click", "--sample-rate", "8000", "--out"])
        .arg(&out)
        .output()
        .expect("failed to run metronome_cli write-click");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let report = &stdout_lines(&output)[0];
    assert_eq!(report["sample_rate"], 8000);
    assert_eq!(report["samples"], 160);

    let reader = hound::WavReader::open(&out).expect("readable WAV");
    assert_eq!(reader.spec().sample_rate, 8000);
    assert_eq!(reader.len(), 160);
}

#[test]
fn status_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"metronome": {"initial_bpm": 96}}"#).unwrap();

    let output = cli()
        .args(["status", "--config"])
        .arg(&config)
        .output()
        .expect("failed to run metronome_cli status");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let status: Value = serde_json::from_str(stdout.trim()).expect("status JSON");
    assert_eq!(status["tempo_bpm"], 96);
    assert_eq!(status["playing"], false);
    assert_eq!(status["period_ms"].as_f64(), Some(625.0));
}

#[test]
fn play_silent_fires_requested_beats() {
    let output = cli()
        .args(["play", "--silent", "--bpm", "120", "--beats", "2"])
        .output()
        .expect("failed to run metronome_cli play");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let events = stdout_lines(&output);
    let kinds: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(kinds.iter().filter(|k| **k == "cue_fired").count(), 2);
    assert!(kinds.contains(&"started"));
    assert_eq!(kinds.last(), Some(&"torn_down"));
}

#[test]
fn play_rejects_off_step_tempo() {
    let output = cli()
        .args(["play", "--silent", "--bpm", "100", "--beats", "1"])
        .output()
        .expect("failed to run metronome_cli play");
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("invalid --bpm 100"), "got {stderr}");
}

#[test]
fn play_streams_events_without_history() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"telemetry": {"channel_capacity": 18446744073709551615, "history_capacity": 0}}"#,
    )
    .unwrap();

    let output = cli()
        .args(["play", "--silent", "--bpm", "120", "--beats", "3", "--config"])
        .arg(&config)
        .output()
        .expect("failed to run metronome_cli play");
    assert!(output.status.success());

    let events = stdout_lines(&output);
    let cues = events.iter().filter(|e| e["type"] == "cue_fired").count();
    assert_eq!(cues, 3);
    assert_eq!(events.last().unwrap()["type"], "torn_down");
}

#[test]
fn write_click_caps_duration() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("long.wav");

    let output = cli()
        .args(["write-click", "--sample-rate", "8000", "--duration-ms", "1e12", "--out"])
        .arg(&out)
        .output()
        .expect("failed to run metronome_cli write-click");
    assert!(output.status.success());

    let report = &stdout_lines(&output)[0];
    assert_eq!(report["samples"], 8000);
}
