//! Click asset references and decoding.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::click::{clamp_click_sample_rate, generate_click_sample};
use crate::error::AudioError;

/// Where the cue sound comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum AssetRef {
    /// Synthesized noise burst, see [`generate_click_sample`]
    #[default]
    Builtin,
    /// WAV file on disk
    Wav(PathBuf),
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Builtin => write!(f, "builtin:click"),
            AssetRef::Wav(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Decoded mono cue audio.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickSample {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl ClickSample {
    pub fn builtin(sample_rate: u32, duration_ms: f32) -> Self {
        let sample_rate = clamp_click_sample_rate(sample_rate);
        Self {
            samples: generate_click_sample(sample_rate, duration_ms),
            sample_rate,
        }
    }

    /// Resolve an asset reference into samples.
    ///
    /// `sample_rate` and `duration_ms` only apply to [`AssetRef::Builtin`].
    pub fn resolve(asset: &AssetRef, sample_rate: u32, duration_ms: f32) -> Result<Self, AudioError> {
        match asset {
            AssetRef::Builtin => Ok(Self::builtin(sample_rate, duration_ms)),
            AssetRef::Wav(path) => Self::from_wav(path),
        }
    }

    pub fn from_wav<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|err| AudioError::AssetLoadFailed {
            asset: label.clone(),
            reason: err.to_string(),
        })?;
        Self::from_reader(std::io::BufReader::new(file)).map_err(|err| match err {
            AudioError::AssetLoadFailed { reason, .. } => AudioError::AssetLoadFailed {
                asset: label,
                reason,
            },
            other => other,
        })
    }

    /// Decode WAV data, downmixing to mono and normalizing integer PCM to [-1, 1].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AudioError> {
        let mut wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        if spec.sample_rate == 0 {
            return Err(AudioError::AssetLoadFailed {
                asset: "<wav>".to_string(),
                reason: "sample rate is zero".to_string(),
            });
        }
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => wav.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1) as u32)) as f32;
                wav.samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        if interleaved.is_empty() {
            return Err(AudioError::AssetLoadFailed {
                asset: "<wav>".to_string(),
                reason: "no audio frames".to_string(),
            });
        }

        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Write as a mono 32-bit float WAV.
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<(), AudioError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Linear-interpolation resample to the output device rate.
    pub fn resampled(&self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate
            || self.samples.is_empty()
            || target_rate == 0
            || self.sample_rate == 0
        {
            return self.clone();
        }

        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_len = ((self.samples.len() as f64) / ratio).round().max(1.0) as usize;
        let last = self.samples.len() - 1;

        let samples = (0..out_len)
            .map(|i| {
                let pos = i as f64 * ratio;
                let idx = (pos.floor() as usize).min(last);
                let next = (idx + 1).min(last);
                let frac = (pos - idx as f64) as f32;
                self.samples[idx] * (1.0 - frac) + self.samples[next] * frac
            })
            .collect();

        Self {
            samples,
            sample_rate: target_rate,
        }
    }
}
