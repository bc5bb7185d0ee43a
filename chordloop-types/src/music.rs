//! Key, mode and chord-quality tables plus note-name parsing.

use serde::{Deserialize, Serialize};

use crate::Pitch;

pub const PITCH_CLASS_NAMES: [&str; 12] =
    ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Musical key (pitch class)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::C,
        Key::Cs,
        Key::D,
        Key::Ds,
        Key::E,
        Key::F,
        Key::Fs,
        Key::G,
        Key::Gs,
        Key::A,
        Key::As,
        Key::B,
    ];

    pub fn name(&self) -> &'static str {
        PITCH_CLASS_NAMES[self.semitone() as usize]
    }

    /// Semitones above C.
    pub fn semitone(&self) -> i32 {
        *self as i32
    }

    pub fn from_semitone(semitone: i32) -> Self {
        Self::ALL[semitone.rem_euclid(12) as usize]
    }

    /// Parse a pitch-class name with any number of `#`/`b` accidentals.
    /// Enharmonic spellings normalize (`Db` -> `C#`, `E#` -> `F`, `Cb` -> `B`).
    pub fn parse(name: &str) -> Option<Self> {
        let (key, rest) = split_pitch_class(name.trim())?;
        if rest.is_empty() {
            Some(key)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn letter_semitone(c: char) -> Option<i32> {
    match c.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Split a leading pitch class (letter + accidentals) off `text`. Returns
/// the key and the remainder, or `None` if `text` doesn't start with one.
pub fn split_pitch_class(text: &str) -> Option<(Key, &str)> {
    let (raw, rest) = split_raw_pitch_class(text)?;
    Some((Key::from_semitone(raw), rest))
}

/// Like `split_pitch_class` but without wrapping, so `B#` is 12 and `Cb` is
/// -1. Needed when an octave number follows.
fn split_raw_pitch_class(text: &str) -> Option<(i32, &str)> {
    let mut chars = text.char_indices();
    let (_, letter) = chars.next()?;
    let mut semitone = letter_semitone(letter)?;
    let mut end = letter.len_utf8();
    for (i, c) in chars {
        match c {
            '#' | '♯' => semitone += 1,
            'b' | '♭' => semitone -= 1,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    Some((semitone, &text[end..]))
}

/// Spell a note name with sharps: `"Db"` -> `"C#"`, `"E#"` -> `"F"`.
pub fn normalize_note_name(name: &str) -> Option<&'static str> {
    Key::parse(name).map(|k| k.name())
}

/// Parse `"C#4"`, `"Bb3"`, `"C-1"` into a pitch (C4 = 60).
pub fn parse_pitch_name(name: &str) -> Option<Pitch> {
    let (class, rest) = split_raw_pitch_class(name.trim())?;
    let octave: i32 = rest.parse().ok()?;
    let value = (octave + 1) * 12 + class;
    if (0..=Pitch::MAX as i32).contains(&value) {
        Some(Pitch::new(value as u8))
    } else {
        None
    }
}

/// Shortest signed distance from `from` to `to`, in `-5..=6` semitones.
pub fn transpose_steps(from: Key, to: Key) -> i32 {
    let steps = (to.semitone() - from.semitone()).rem_euclid(12);
    if steps > 6 {
        steps - 12
    } else {
        steps
    }
}

/// Shift the root and the slash bass of a chord name by `steps`, spelled
/// with sharps. A name without an upper-case root (a bare quality such as
/// `m7`) is returned as is.
pub fn transpose_chord_name(name: &str, steps: i32) -> String {
    match name.split_once('/') {
        Some((base, bass)) => format!("{}/{}", shift_root(base, steps), shift_root(bass, steps)),
        None => shift_root(name, steps),
    }
}

fn shift_root(text: &str, steps: i32) -> String {
    if !text.starts_with(|c: char| c.is_ascii_uppercase()) {
        return text.to_string();
    }
    match split_pitch_class(text) {
        Some((root, rest)) => format!("{}{}", Key::from_semitone(root.semitone() + steps), rest),
        None => text.to_string(),
    }
}

/// Scale modes, as intervals from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    HarmonicMinor,
    MelodicMinor,
    Pentatonic,
    MinorPentatonic,
    Blues,
}

impl Mode {
    pub const ALL: [Mode; 12] = [
        Mode::Major,
        Mode::Minor,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Locrian,
        Mode::HarmonicMinor,
        Mode::MelodicMinor,
        Mode::Pentatonic,
        Mode::MinorPentatonic,
        Mode::Blues,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
            Mode::Dorian => "Dorian",
            Mode::Phrygian => "Phrygian",
            Mode::Lydian => "Lydian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Locrian => "Locrian",
            Mode::HarmonicMinor => "Harmonic Minor",
            Mode::MelodicMinor => "Melodic Minor",
            Mode::Pentatonic => "Pentatonic",
            Mode::MinorPentatonic => "Minor Pentatonic",
            Mode::Blues => "Blues",
        }
    }

    /// Semitone intervals from root for this mode
    pub fn intervals(&self) -> &'static [i32] {
        match self {
            Mode::Major => &[0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Mode::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Mode::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Mode::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Mode::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Mode::Pentatonic => &[0, 2, 4, 7, 9],
            Mode::MinorPentatonic => &[0, 3, 5, 7, 10],
            Mode::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    /// Case-insensitive; spaces, dashes and underscores are ignored.
    /// `Ionian` and `Aeolian` map to major and minor.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded = fold_name(name);
        match folded.as_str() {
            "ionian" => return Some(Mode::Major),
            "aeolian" | "naturalminor" => return Some(Mode::Minor),
            "majorpentatonic" => return Some(Mode::Pentatonic),
            _ => {}
        }
        Self::ALL.iter().copied().find(|m| fold_name(m.name()) == folded)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Chord qualities by suffix, as intervals from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    Sus2,
    Sus4,
    Major6,
    Minor6,
    Dominant9,
    Add9,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 15] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Dominant7,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::HalfDiminished7,
        ChordQuality::Diminished7,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
        ChordQuality::Major6,
        ChordQuality::Minor6,
        ChordQuality::Dominant9,
        ChordQuality::Add9,
    ];

    /// Canonical suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Major6 => "6",
            ChordQuality::Minor6 => "m6",
            ChordQuality::Dominant9 => "9",
            ChordQuality::Add9 => "add9",
        }
    }

    pub fn intervals(&self) -> &'static [i32] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Major6 => &[0, 4, 7, 9],
            ChordQuality::Minor6 => &[0, 3, 7, 9],
            ChordQuality::Dominant9 => &[0, 4, 7, 10, 14],
            ChordQuality::Add9 => &[0, 4, 7, 14],
        }
    }

    /// Accepts the canonical suffix and common aliases (`min`, `M7`, `°`, `ø`, ...).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let q = match suffix {
            "" | "maj" | "M" => ChordQuality::Major,
            "m" | "min" | "-" => ChordQuality::Minor,
            "dim" | "°" | "o" => ChordQuality::Diminished,
            "aug" | "+" => ChordQuality::Augmented,
            "7" | "dom7" => ChordQuality::Dominant7,
            "maj7" | "M7" | "Δ" | "Δ7" => ChordQuality::Major7,
            "m7" | "min7" | "-7" => ChordQuality::Minor7,
            "m7b5" | "ø" | "ø7" | "min7b5" => ChordQuality::HalfDiminished7,
            "dim7" | "°7" | "o7" => ChordQuality::Diminished7,
            "sus2" => ChordQuality::Sus2,
            "sus4" | "sus" => ChordQuality::Sus4,
            "6" | "maj6" => ChordQuality::Major6,
            "m6" | "min6" => ChordQuality::Minor6,
            "9" | "dom9" => ChordQuality::Dominant9,
            "add9" | "add2" => ChordQuality::Add9,
            _ => return None,
        };
        Some(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parse_sharps_and_flats() {
        assert_eq!(Key::parse("C"), Some(Key::C));
        assert_eq!(Key::parse("F#"), Some(Key::Fs));
        assert_eq!(Key::parse("Gb"), Some(Key::Fs));
        assert_eq!(Key::parse("Bb"), Some(Key::As));
        assert_eq!(Key::parse("e"), Some(Key::E));
        assert_eq!(Key::parse("H"), None);
        assert_eq!(Key::parse("C7"), None);
    }

    #[test]
    fn test_enharmonic_normalization() {
        assert_eq!(normalize_note_name("E#"), Some("F"));
        assert_eq!(normalize_note_name("Cb"), Some("B"));
        assert_eq!(normalize_note_name("B#"), Some("C"));
        assert_eq!(normalize_note_name("Fb"), Some("E"));
        assert_eq!(normalize_note_name("C##"), Some("D"));
        assert_eq!(normalize_note_name("Ebb"), Some("D"));
    }

    #[test]
    fn test_parse_pitch_name() {
        assert_eq!(parse_pitch_name("C4"), Some(Pitch::new(60)));
        assert_eq!(parse_pitch_name("A0"), Some(Pitch::new(21)));
        assert_eq!(parse_pitch_name("Bb3"), Some(Pitch::new(58)));
        assert_eq!(parse_pitch_name("B#4"), Some(Pitch::new(72)));
        assert_eq!(parse_pitch_name("Cb4"), Some(Pitch::new(59)));
        assert_eq!(parse_pitch_name("C-1"), Some(Pitch::new(0)));
        assert_eq!(parse_pitch_name("G9"), Some(Pitch::new(127)));
        assert_eq!(parse_pitch_name("A9"), None);
        assert_eq!(parse_pitch_name("C"), None);
    }

    #[test]
    fn test_transpose_steps_take_shortest_path() {
        assert_eq!(transpose_steps(Key::C, Key::D), 2);
        assert_eq!(transpose_steps(Key::C, Key::A), -3);
        assert_eq!(transpose_steps(Key::C, Key::Fs), 6);
        assert_eq!(transpose_steps(Key::B, Key::C), 1);
        assert_eq!(transpose_steps(Key::G, Key::G), 0);
    }

    #[test]
    fn test_transpose_chord_name() {
        assert_eq!(transpose_chord_name("Am7", 2), "Bm7");
        assert_eq!(transpose_chord_name("Cmaj7/E", 2), "Dmaj7/F#");
        assert_eq!(transpose_chord_name("Bbm", 1), "Bm");
        assert_eq!(transpose_chord_name("F#m7b5", -3), "D#m7b5");
        assert_eq!(transpose_chord_name("E", 1), "F");
        // bare qualities follow the key by themselves
        assert_eq!(transpose_chord_name("m7", 5), "m7");
        assert_eq!(transpose_chord_name("add9", 5), "add9");
        assert_eq!(transpose_chord_name("dim", 5), "dim");
    }

    #[test]
    fn test_mode_from_name() {
        assert_eq!(Mode::from_name("major"), Some(Mode::Major));
        assert_eq!(Mode::from_name("Ionian"), Some(Mode::Major));
        assert_eq!(Mode::from_name("aeolian"), Some(Mode::Minor));
        assert_eq!(Mode::from_name("harmonic_minor"), Some(Mode::HarmonicMinor));
        assert_eq!(Mode::from_name("Melodic Minor"), Some(Mode::MelodicMinor));
        assert_eq!(Mode::from_name("bebop"), None);
        for m in Mode::ALL {
            assert_eq!(Mode::from_name(m.name()), Some(m));
            assert_eq!(m.intervals()[0], 0);
        }
    }

    #[test]
    fn test_chord_suffixes() {
        for q in ChordQuality::ALL {
            assert_eq!(ChordQuality::from_suffix(q.suffix()), Some(q));
        }
        assert_eq!(ChordQuality::from_suffix("min7"), Some(ChordQuality::Minor7));
        assert_eq!(ChordQuality::from_suffix("13b9"), None);
    }
}
