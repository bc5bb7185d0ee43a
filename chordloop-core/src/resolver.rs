//! Built-in `NoteResolver` backed by the interval tables in
//! `chordloop_types::music`.

use regex::Regex;

use chordloop_types::music::{ChordQuality, Key, Mode};
use chordloop_types::{ChordloopError, NoteResolver, NoteSet, Pitch, Result};

/// MIDI note of C in the octave chords and scales are voiced from.
const BASE_C: i32 = 60;

/// Resolves chord names (`Am7`, `F#dim`, `C/E`, or a bare quality such as
/// `maj7` rooted on the key) and mode names (`Dorian`, rooted on the key).
pub struct IntervalResolver {
    chord_re: Option<Regex>,
}

impl Default for IntervalResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalResolver {
    pub fn new() -> Self {
        let chord_re = match Regex::new(r"^([A-Ga-g][#b♯♭]*)([^/]*)(?:/([A-Ga-g][#b♯♭]*))?$") {
            Ok(re) => Some(re),
            Err(e) => {
                log::error!(target: "resolver", "chord name pattern failed to compile: {}", e);
                None
            }
        };
        Self { chord_re }
    }

    /// `root` + `quality`, stacked upward from the root in octave 4. A slash
    /// bass goes first, below the root, and is dropped from the upper tones.
    pub fn chord(root: Key, quality: ChordQuality, bass: Option<Key>) -> NoteSet {
        let root_pitch = BASE_C + root.semitone();
        let upper = quality.intervals().iter().map(|i| root_pitch + i);
        let Some(bass) = bass else {
            return NoteSet::new(upper.filter_map(to_pitch));
        };
        let mut bass_pitch = BASE_C + bass.semitone();
        if bass_pitch >= root_pitch {
            bass_pitch -= 12;
        }
        let bass_class = bass.semitone();
        let tones = std::iter::once(bass_pitch)
            .chain(upper.filter(|p| p.rem_euclid(12) != bass_class));
        NoteSet::new(tones.filter_map(to_pitch))
    }

    /// The mode's degrees, ascending from the key in octave 4.
    pub fn scale(key: Key, mode: Mode) -> NoteSet {
        let root = BASE_C + key.semitone();
        NoteSet::new(mode.intervals().iter().map(|i| root + i).filter_map(to_pitch))
    }

    fn parse_chord(&self, name: &str) -> Option<(Key, ChordQuality, Option<Key>)> {
        let caps = self.chord_re.as_ref()?.captures(name)?;
        let root = Key::parse(caps.get(1)?.as_str())?;
        let quality = ChordQuality::from_suffix(caps.get(2).map_or("", |m| m.as_str()))?;
        let bass = match caps.get(3) {
            Some(m) => Some(Key::parse(m.as_str())?),
            None => None,
        };
        Some((root, quality, bass))
    }
}

fn to_pitch(value: i32) -> Option<Pitch> {
    u8::try_from(value).ok().filter(|v| *v <= Pitch::MAX).map(Pitch::new)
}

impl NoteResolver for IntervalResolver {
    fn lookup(&self, name: &str, key: &str) -> Result<NoteSet> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChordloopError::NotFound("empty name".into()));
        }
        if let Some((root, quality, bass)) = self.parse_chord(name) {
            return Ok(Self::chord(root, quality, bass));
        }
        let key = Key::parse(key).ok_or_else(|| ChordloopError::NotFound(format!("key {:?}", key)))?;
        if let Some(quality) = ChordQuality::from_suffix(name) {
            return Ok(Self::chord(key, quality, None));
        }
        if let Some(mode) = Mode::from_name(name) {
            return Ok(Self::scale(key, mode));
        }
        Err(ChordloopError::NotFound(format!("{} in {}", name, key)))
    }
}
