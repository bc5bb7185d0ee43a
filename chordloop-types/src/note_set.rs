use serde::{Deserialize, Serialize};

use crate::Pitch;

/// Ordered pitches with no duplicates. Order is the order the resolver
/// produced (lowest voice first for chords, ascending for scales).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Pitch>", into = "Vec<Pitch>")]
pub struct NoteSet {
    pitches: Vec<Pitch>,
}

impl NoteSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from pitches, keeping the first occurrence of each.
    pub fn new(pitches: impl IntoIterator<Item = Pitch>) -> Self {
        let mut out: Vec<Pitch> = Vec::new();
        for p in pitches {
            if !out.contains(&p) {
                out.push(p);
            }
        }
        Self { pitches: out }
    }

    pub fn from_midi(notes: &[u8]) -> Self {
        Self::new(notes.iter().copied().map(Pitch::new))
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Pitch> {
        self.pitches.get(index).copied()
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.pitches.contains(&pitch)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pitch> + '_ {
        self.pitches.iter().copied()
    }

    /// Every pitch shifted by `semitones`, order kept. Pitches pushed past
    /// the MIDI range are dropped.
    pub fn transposed(&self, semitones: i32) -> Self {
        self.iter().filter_map(|p| p.offset(semitones)).collect()
    }

    /// Move the pitch at `from` to position `to`. False if either is out of
    /// range.
    pub fn move_pitch(&mut self, from: usize, to: usize) -> bool {
        if from >= self.pitches.len() || to >= self.pitches.len() {
            return false;
        }
        let pitch = self.pitches.remove(from);
        self.pitches.insert(to, pitch);
        true
    }

    /// Append a pitch if it is not already present.
    pub fn push(&mut self, pitch: Pitch) -> bool {
        if self.pitches.contains(&pitch) {
            return false;
        }
        self.pitches.push(pitch);
        true
    }
}

impl From<Vec<Pitch>> for NoteSet {
    fn from(pitches: Vec<Pitch>) -> Self {
        Self::new(pitches)
    }
}

impl From<NoteSet> for Vec<Pitch> {
    fn from(set: NoteSet) -> Self {
        set.pitches
    }
}

impl FromIterator<Pitch> for NoteSet {
    fn from_iter<I: IntoIterator<Item = Pitch>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl std::fmt::Display for NoteSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, p) in self.pitches.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}
