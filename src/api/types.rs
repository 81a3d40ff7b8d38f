use crate::engine::Tempo;

/// One entry of the tempo picker
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TempoOption {
    pub bpm: u32,
    /// Time between cues in milliseconds
    pub period_ms: f64,
}

impl From<Tempo> for TempoOption {
    fn from(tempo: Tempo) -> Self {
        Self {
            bpm: tempo.bpm(),
            period_ms: tempo.period().as_secs_f64() * 1000.0,
        }
    }
}
