//! Tempo - validated BPM values for the practice metronome
//!
//! The rate control only offers six settings, 60 to 120 BPM in steps of 12.
//! `Tempo` can only be built from one of those values, so a stored tempo is
//! always inside the domain.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TempoError;

/// Nanoseconds in one minute
const NANOS_PER_MINUTE: u64 = 60_000_000_000;

/// Beats per minute, restricted to `{60, 72, 84, 96, 108, 120}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Tempo(u32);

impl Tempo {
    pub const MIN: Tempo = Tempo(60);
    pub const MAX: Tempo = Tempo(120);
    pub const STEP: u32 = 12;

    /// Validate a BPM value.
    ///
    /// Values are rejected rather than clamped so the caller's stepping stays explicit.
    pub fn new(bpm: u32) -> Result<Self, TempoError> {
        if bpm < Self::MIN.0 || bpm > Self::MAX.0 {
            return Err(TempoError::OutOfRange { bpm });
        }
        if (bpm - Self::MIN.0) % Self::STEP != 0 {
            return Err(TempoError::OffStep { bpm });
        }
        Ok(Tempo(bpm))
    }

    #[inline]
    pub fn bpm(self) -> u32 {
        self.0
    }

    /// Time between two consecutive cues: `60_000 / bpm` milliseconds.
    ///
    /// # Examples
    /// ```
    /// use short_game_trainer::engine::Tempo;
    /// use std::time::Duration;
    ///
    /// assert_eq!(Tempo::MIN.period(), Duration::from_millis(1000));
    /// assert_eq!(Tempo::MAX.period(), Duration::from_millis(500));
    /// ```
    #[inline]
    pub fn period(self) -> Duration {
        Duration::from_nanos(NANOS_PER_MINUTE / self.0 as u64)
    }

    /// Every valid tempo, slowest first.
    pub fn all() -> impl Iterator<Item = Tempo> {
        (Self::MIN.0..=Self::MAX.0)
            .step_by(Self::STEP as usize)
            .map(Tempo)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo::MIN
    }
}

impl TryFrom<u32> for Tempo {
    type Error = TempoError;

    fn try_from(bpm: u32) -> Result<Self, Self::Error> {
        Tempo::new(bpm)
    }
}

impl From<Tempo> for u32 {
    fn from(tempo: Tempo) -> Self {
        tempo.0
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_values_accepted() {
        for bpm in [60, 72, 84, 96, 108, 120] {
            let tempo = Tempo::new(bpm).unwrap();
            assert_eq!(tempo.bpm(), bpm);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(Tempo::new(0), Err(TempoError::OutOfRange { bpm: 0 }));
        assert_eq!(Tempo::new(48), Err(TempoError::OutOfRange { bpm: 48 }));
        assert_eq!(Tempo::new(132), Err(TempoError::OutOfRange { bpm: 132 }));
    }

    #[test]
    fn test_off_step_rejected() {
        assert_eq!(Tempo::new(61), Err(TempoError::OffStep { bpm: 61 }));
        assert_eq!(Tempo::new(100), Err(TempoError::OffStep { bpm: 100 }));
    }

    #[test]
    fn test_period_formula() {
        // period = 60_000 / bpm milliseconds
        assert_eq!(Tempo::new(60).unwrap().period(), Duration::from_millis(1000));
        assert_eq!(Tempo::new(96).unwrap().period(), Duration::from_millis(625));
        assert_eq!(Tempo::new(120).unwrap().period(), Duration::from_millis(500));
        assert_eq!(
            Tempo::new(72).unwrap().period(),
            Duration::from_nanos(833_333_333)
        );
    }

    #[test]
    fn test_all_lists_domain() {
        let bpms: Vec<u32> = Tempo::all().map(Tempo::bpm).collect();
        assert_eq!(bpms, vec![60, 72, 84, 96, 108, 120]);
    }

    #[test]
    fn test_serde_validates() {
        let tempo: Tempo = serde_json::from_str("84").unwrap();
        assert_eq!(tempo.bpm(), 84);
        assert_eq!(serde_json::to_string(&tempo).unwrap(), "84");
        assert!(serde_json::from_str::<Tempo>("85").is_err());
    }
}
