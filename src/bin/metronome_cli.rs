use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use short_game_trainer::audio::{AudioResourceProvider, ClickSample, SilentProvider};
use short_game_trainer::config::AppConfig;
use short_game_trainer::engine::{MetronomeEngine, MetronomeStatus, Tempo};
use short_game_trainer::telemetry::MetronomeEvent;
use short_game_trainer::{init_logging, metronome_tempo_options};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

#[derive(Parser, Debug)]
#[command(
    name = "metronome_cli",
    about = "Desktop harness for the short-game practice metronome"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a number of beats and print the engine events as JSON lines
    Play {
        #[arg(long, default_value_t = 60)]
        bpm: u32,
        #[arg(long, default_value_t = 4)]
        beats: u32,
        /// Config file (defaults to assets/metronome_config.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Run without an audio device
        #[arg(long)]
        silent: bool,
    },
    /// List selectable tempos with their cue periods
    Tempos,
    /// Render the built-in click to a WAV file
    WriteClick {
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        sample_rate: Option<u32>,
        #[arg(long)]
        duration_ms: Option<f32>,
    },
    /// Print the idle engine status for a config
    Status {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            bpm,
            beats,
            config,
            silent,
        } => run_play(bpm, beats, load_config(config), silent),
        Commands::Tempos => run_tempos(),
        Commands::WriteClick {
            out,
            sample_rate,
            duration_ms,
        } => run_write_click(out, sample_rate, duration_ms),
        Commands::Status { config } => run_status(load_config(config)),
    }
}

fn load_config(path: Option<PathBuf>) -> AppConfig {
    match path {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building tokio runtime")
}

fn provider_for(config: &AppConfig, silent: bool) -> Arc<dyn AudioResourceProvider> {
    if silent {
        return Arc::new(SilentProvider::new());
    }
    cfg_if::cfg_if! {
        if #[cfg(target_os = "android")] {
            let _ = config;
            Arc::new(SilentProvider::new())
        } else {
            Arc::new(short_game_trainer::audio::CpalProvider::new(config.audio.clone()))
        }
    }
}

fn run_play(bpm: u32, beats: u32, config: AppConfig, silent: bool) -> Result<ExitCode> {
    let tempo = Tempo::new(bpm).with_context(|| format!("invalid --bpm {}", bpm))?;
    let period = tempo.period();
    // Half a period of slack so the last beat lands before stop.
    let run_for = period
        .checked_mul(beats)
        .and_then(|run| run.checked_add(period / 2))
        .with_context(|| format!("invalid --beats {}: run length overflows", beats))?;
    let runtime = build_runtime()?;
    let provider = provider_for(&config, silent);

    let cues = runtime.block_on(async move {
        let engine = MetronomeEngine::new(provider, &config);
        let printer = tokio::spawn(print_events(engine.subscribe()));
        let mut loaded = engine.subscribe();
        engine.initialize();
        wait_for_asset(&mut loaded).await;
        drop(loaded);

        engine
            .set_tempo(tempo.bpm())
            .with_context(|| format!("setting tempo {}", tempo))?;
        engine.start();
        tokio::time::sleep(run_for).await;

        engine.stop();
        engine.teardown();
        printer.await.context("event printer task failed")?
    })?;

    log::info!("[metronome_cli] {} cues fired at {}", cues, tempo);
    Ok(ExitCode::from(0))
}

/// Print events as JSON lines until teardown; returns the number of cues fired.
async fn print_events(mut events: Receiver<MetronomeEvent>) -> Result<u64> {
    let mut cues = 0u64;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("[metronome_cli] Output fell behind, skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if matches!(event, MetronomeEvent::CueFired { .. }) {
            cues += 1;
        }
        let line = serde_json::to_string(&event)?;
        writeln!(std::io::stdout().lock(), "{}", line).context("writing event")?;

        if event == MetronomeEvent::TornDown {
            break;
        }
    }
    Ok(cues)
}

/// Give the asset load a moment so the first cue is audible.
async fn wait_for_asset(events: &mut Receiver<MetronomeEvent>) {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(MetronomeEvent::AssetLoaded { .. })
                | Ok(MetronomeEvent::AssetLoadFailed { .. }) => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(2), wait).await.is_err() {
        log::warn!("[metronome_cli] Asset still loading, starting anyway");
    }
}

fn run_tempos() -> Result<ExitCode> {
    for option in metronome_tempo_options() {
        println!("{}", serde_json::to_string(&option)?);
    }
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct ClickReport<'a> {
    path: &'a str,
    sample_rate: u32,
    samples: usize,
    duration_ms: f64,
}

fn run_write_click(
    out: PathBuf,
    sample_rate: Option<u32>,
    duration_ms: Option<f32>,
) -> Result<ExitCode> {
    let defaults = AppConfig::default().audio;
    let sample_rate = sample_rate.unwrap_or(defaults.click_sample_rate);
    let duration_ms = duration_ms.unwrap_or(defaults.click_duration_ms);

    let click = ClickSample::builtin(sample_rate, duration_ms);
    click
        .write_wav(&out)
        .with_context(|| format!("writing click to {}", out.display()))?;

    let path = out.to_string_lossy();
    let report = ClickReport {
        path: &path,
        sample_rate: click.sample_rate,
        samples: click.samples.len(),
        duration_ms: click.duration().as_secs_f64() * 1000.0,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(ExitCode::from(0))
}

fn run_status(config: AppConfig) -> Result<ExitCode> {
    let runtime = build_runtime()?;
    let status: MetronomeStatus = runtime.block_on(async move {
        let engine = MetronomeEngine::new(Arc::new(SilentProvider::new()), &config);
        engine.status()
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(ExitCode::from(0))
}
