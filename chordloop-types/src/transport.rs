use std::time::Duration;

use crate::Pitch;

pub const MIN_BPM: f32 = 20.0;
pub const MAX_BPM: f32 = 300.0;
pub const DEFAULT_BPM: f32 = 120.0;

/// Clamp into `[MIN_BPM, MAX_BPM]`; NaN becomes the default tempo.
pub fn clamp_bpm(bpm: f32) -> f32 {
    if bpm.is_nan() {
        return DEFAULT_BPM;
    }
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// Time between two steps: `60 / bpm / steps_per_beat` seconds.
pub fn step_interval(bpm: f32, steps_per_beat: u32) -> Duration {
    let spb = steps_per_beat.max(1) as f64;
    Duration::from_secs_f64(60.0 / clamp_bpm(bpm) as f64 / spb)
}

/// Pattern step resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subdivision {
    Quarter,
    Eighth,
    Triplet,
    #[default]
    Sixteenth,
}

impl Subdivision {
    pub const ALL: [Subdivision; 4] = [
        Subdivision::Quarter,
        Subdivision::Eighth,
        Subdivision::Triplet,
        Subdivision::Sixteenth,
    ];

    pub fn steps_per_beat(&self) -> u32 {
        match self {
            Subdivision::Quarter => 1,
            Subdivision::Eighth => 2,
            Subdivision::Triplet => 3,
            Subdivision::Sixteenth => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Subdivision::Quarter => "quarter",
            Subdivision::Eighth => "eighth",
            Subdivision::Triplet => "triplet",
            Subdivision::Sixteenth => "sixteenth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "triplets" => Some(Subdivision::Triplet),
            _ => Self::ALL.iter().copied().find(|s| s.name() == name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub running: bool,
    pub bpm: f32,
    /// Monotonic; wraps modulo the pattern length only when indexing.
    pub current_step: u64,
}

impl Default for TransportState {
    fn default() -> Self {
        Self { running: false, bpm: DEFAULT_BPM, current_step: 0 }
    }
}

/// Where the sounding notes come from, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    Preview,
    Saved(usize),
    #[default]
    Nothing,
}

/// Read-only view of the transport for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransportSnapshot {
    pub running: bool,
    pub bpm: f32,
    pub current_step: u64,
    pub pattern_len: usize,
    /// Step index inside the pattern that fired last.
    pub active_step: Option<usize>,
    pub source: SourceKind,
    /// Pitches the engine currently holds.
    pub sounding: Vec<Pitch>,
}
