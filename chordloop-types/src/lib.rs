//! # chordloop-types
//!
//! Shared data model for the chordloop workspace: pitches, note sets,
//! patterns and their bindings, the saved chord sequence, selection,
//! playback settings, transport values, music names and the intents the
//! front end dispatches. Nothing in here spawns threads or talks to audio.

pub mod action;
pub mod dispatch;
mod error;
pub mod music;
mod note_set;
pub mod pattern;
pub mod presets;
mod resolver;
pub mod selection;
pub mod sequence;
pub mod settings;
pub mod transport;

pub use action::*;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{ChordloopError, Result};
pub use note_set::NoteSet;
pub use pattern::{Pattern, PatternBindings, PatternTarget, StepNote, StepSpec};
pub use resolver::NoteResolver;
pub use selection::{ActiveSource, SelectionState};
pub use sequence::{SequenceEntry, SequenceStore};
pub use settings::{Effect, EqBand, EqSettings, PlaybackSettings};
pub use transport::{SourceKind, Subdivision, TransportSnapshot, TransportState};

/// One playable key, as a MIDI note number (C4 = 60).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Pitch(u8);

impl Pitch {
    pub const MAX: u8 = 127;

    /// Create a pitch. Values above 127 saturate.
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Pitch class, 0 = C.
    pub fn class(self) -> u8 {
        self.0 % 12
    }

    /// Octave in scientific notation (MIDI 60 is octave 4).
    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Offset by a number of semitones, `None` when leaving 0..=127.
    pub fn offset(self, semitones: i32) -> Option<Self> {
        let value = self.0 as i32 + semitones;
        if (0..=Self::MAX as i32).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }
}

impl std::fmt::Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", music::PITCH_CLASS_NAMES[self.class() as usize], self.octave())
    }
}

/// Inclusive range of pitches an instrument can sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PitchRange {
    pub first: Pitch,
    pub last: Pitch,
}

impl PitchRange {
    /// 88-key piano, A0..C8.
    pub const PIANO: PitchRange = PitchRange { first: Pitch(21), last: Pitch(108) };

    /// Build a range, swapping the bounds if they are given in reverse.
    pub fn new(first: Pitch, last: Pitch) -> Self {
        if first <= last {
            Self { first, last }
        } else {
            Self { first: last, last: first }
        }
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        pitch >= self.first && pitch <= self.last
    }

    /// Saturate an arbitrary note number into the range.
    pub fn clamp(&self, value: i32) -> Pitch {
        let clamped = value.clamp(self.first.get() as i32, self.last.get() as i32);
        Pitch(clamped as u8)
    }
}

impl Default for PitchRange {
    fn default() -> Self {
        Self::PIANO
    }
}

/// Stable identifier of a saved sequence entry. Survives index shifts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(u32);

impl EntryId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
