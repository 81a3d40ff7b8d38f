//! Click - deterministic metronome cue synthesis
//!
//! The built-in cue is a short white noise burst with a linear decay, so it
//! cuts through outdoor ambient noise on a phone speaker without sounding
//! like a tone. Generation is seeded and therefore identical across calls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default duration of the metronome click in milliseconds
pub const DEFAULT_CLICK_DURATION_MS: f32 = 20.0;

/// Default sample rate used for the built-in click
pub const DEFAULT_CLICK_SAMPLE_RATE: u32 = 48_000;

/// Longest click the generator will render
pub const MAX_CLICK_DURATION_MS: f32 = 1000.0;

/// Supported click sample rate range in Hz
pub const MIN_CLICK_SAMPLE_RATE: u32 = 8_000;
pub const MAX_CLICK_SAMPLE_RATE: u32 = 192_000;

const CLICK_SEED: u64 = 42;

/// Clamp a click sample rate into the supported range.
pub fn clamp_click_sample_rate(sample_rate: u32) -> u32 {
    sample_rate.clamp(MIN_CLICK_SAMPLE_RATE, MAX_CLICK_SAMPLE_RATE)
}

/// Clamp a click duration to `0..=MAX_CLICK_DURATION_MS`; NaN becomes zero.
pub fn clamp_click_duration_ms(duration_ms: f32) -> f32 {
    if duration_ms.is_nan() {
        return 0.0;
    }
    duration_ms.clamp(0.0, MAX_CLICK_DURATION_MS)
}

/// Generates a metronome click sample (white noise burst with linear decay).
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz (typically 48000)
/// * `duration_ms` - Length of the burst in milliseconds
///
/// # Returns
/// A `Vec<f32>` with `sample_rate * duration_ms / 1000` samples in range [-1.0, 1.0]
///
/// # Examples
/// ```
/// use short_game_trainer::audio::click::generate_click_sample;
///
/// let click = generate_click_sample(48000, 20.0);
/// assert_eq!(click.len(), 960);
/// ```
pub fn generate_click_sample(sample_rate: u32, duration_ms: f32) -> Vec<f32> {
    let sample_rate = clamp_click_sample_rate(sample_rate);
    let duration_ms = clamp_click_duration_ms(duration_ms);
    let num_samples = (sample_rate as f32 * duration_ms / 1000.0) as usize;

    let mut rng = StdRng::seed_from_u64(CLICK_SEED);

    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let envelope = 1.0 - i as f32 / num_samples as f32;
        samples.push(rng.gen_range(-1.0..1.0) * envelope);
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_click_sample_duration() {
        let sample_rates = [44100, 48000, 96000];

        for &sr in &sample_rates {
            let click = generate_click_sample(sr, DEFAULT_CLICK_DURATION_MS);
            let expected_samples = (sr as f32 * DEFAULT_CLICK_DURATION_MS / 1000.0) as usize;
            assert_eq!(
                click.len(),
                expected_samples,
                "Click duration should be exactly 20ms at {} Hz",
                sr
            );
        }
    }

    #[test]
    fn test_generate_click_sample_range() {
        let click = generate_click_sample(48000, DEFAULT_CLICK_DURATION_MS);

        for (i, &sample) in click.iter().enumerate() {
            assert!(
                (-1.0..=1.0).contains(&sample),
                "Sample {} at index {} is out of range [-1.0, 1.0]",
                sample,
                i
            );
        }
    }

    #[test]
    fn test_generate_click_sample_decays() {
        let click = generate_click_sample(48000, DEFAULT_CLICK_DURATION_MS);
        let quarter = click.len() / 4;
        let head: f32 = click[..quarter].iter().map(|s| s.abs()).sum();
        let tail: f32 = click[click.len() - quarter..].iter().map(|s| s.abs()).sum();
        assert!(head > tail, "Click should decay: head {} tail {}", head, tail);
    }

    #[test]
    fn test_generate_click_sample_deterministic() {
        let click1 = generate_click_sample(48000, DEFAULT_CLICK_DURATION_MS);
        let click2 = generate_click_sample(48000, DEFAULT_CLICK_DURATION_MS);
        assert_eq!(click1, click2);
    }

    #[test]
    fn test_zero_duration_is_empty() {
        assert!(generate_click_sample(48000, 0.0).is_empty());
        assert!(generate_click_sample(48000, -5.0).is_empty());
    }

    #[test]
    fn test_oversized_request_is_capped() {
        let click = generate_click_sample(48000, f32::MAX);
        assert_eq!(click.len(), 48000);

        let click = generate_click_sample(u32::MAX, DEFAULT_CLICK_DURATION_MS);
        let expected = (MAX_CLICK_SAMPLE_RATE as f32 * DEFAULT_CLICK_DURATION_MS / 1000.0) as usize;
        assert_eq!(click.len(), expected);
    }

    #[test]
    fn test_nan_duration_is_empty() {
        assert!(generate_click_sample(48000, f32::NAN).is_empty());
    }
}
