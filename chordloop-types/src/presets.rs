//! Named pattern presets, grouped by category.

use crate::{Pattern, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternCategory {
    Basic,
    Rhythmic,
    Advanced,
    Genre,
}

impl PatternCategory {
    pub const ALL: [PatternCategory; 4] = [
        PatternCategory::Basic,
        PatternCategory::Rhythmic,
        PatternCategory::Advanced,
        PatternCategory::Genre,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PatternCategory::Basic => "Basic",
            PatternCategory::Rhythmic => "Rhythmic",
            PatternCategory::Advanced => "Advanced",
            PatternCategory::Genre => "Genre",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatternPreset {
    pub name: &'static str,
    pub notation: &'static str,
    pub description: &'static str,
    pub category: PatternCategory,
}

impl PatternPreset {
    pub fn pattern(&self) -> Result<Pattern> {
        Pattern::parse(self.notation)
    }
}

const fn preset(
    name: &'static str,
    notation: &'static str,
    description: &'static str,
    category: PatternCategory,
) -> PatternPreset {
    PatternPreset { name, notation, description, category }
}

use PatternCategory::{Advanced, Basic, Genre, Rhythmic};

pub const PRESETS: &[PatternPreset] = &[
    preset("Root Only", "1 x 1 x", "Simple root note emphasis", Basic),
    preset("Root Bass", "1 x x x 1 x x x", "Steady root note bass line", Basic),
    preset("Up Down", "1 2 3 4 3 2", "Classic ascending and descending", Basic),
    preset("Broken Chord", "1 3 2 4", "Mixed chord tones", Basic),
    preset("Octave Jump", "1 1+ 1 1+", "Root note with octave jumps", Basic),
    preset("Waltz", "1 2 3", "Three-beat waltz pattern", Basic),
    preset("Alberti Bass", "1 3 2 3 1 3 2 3", "Classical broken chord accompaniment", Basic),
    preset("Syncopated", "x 1 x 2 x 3 1 x", "Off-beat emphasis", Rhythmic),
    preset("Dotted Rhythm", "1 x x 2 x x", "Long-short rhythm pattern", Rhythmic),
    preset("Staccato", "1 x 2 x 3 x 4 x", "Short, detached notes", Rhythmic),
    preset("Legato Flow", "1 2 3 4 4 3 2 1", "Smooth, connected motion", Advanced),
    preset("Fifth Wheel", "1 2 3 4 5", "Simple ascent through 5-note chord", Basic),
    preset("Pentagon", "1 3 5 2 4 1", "Geometric pattern through 5 notes", Basic),
    preset("Five Alive", "1 5 2 4 3 5 1 x", "Dynamic 5-note exploration", Advanced),
    preset("Jazz Walk", "1 2 3 4 5 4 3 2", "Walking bass with 5th extension", Advanced),
    preset("Quintet Roll", "1 x 2 3 x 4 5 x", "Rolled chord with gaps", Rhythmic),
    preset("High Five", "1 2+ 3 4+ 5 1+", "Mix of regular and high octave notes", Advanced),
    preset("Hexagon", "1 2 3 4 5 6", "Complete 6-note ascent", Basic),
    preset("Six Pack", "1 6 2 5 3 4", "Outside-in pattern", Advanced),
    preset("Jazz Cascade", "1 3 5 6 4 2 1 x", "Complex jazz voicing pattern", Advanced),
    preset("Spiral Six", "1 4 2 5 3 6 1", "Spiraling through 6 notes", Advanced),
    preset("Double Triple", "1 2 3 4 5 6 6 5 4 3 2 1", "Up and down through all 6 notes", Advanced),
    preset("Sixth Sense", "1 x 3 x 5 x 6 x", "Selective 6-note chord tones", Rhythmic),
    preset("Polyrhythm", "1 x x 2 x 3 x x 1 x 3 x", "Complex rhythmic displacement", Rhythmic),
    preset("Bounce", "1 4 1 4 2 3 2 3", "Bouncing between chord tones", Advanced),
    preset("Cascade", "4+ 3+ 2+ 1+ 4 3 2 1", "Falling through two octaves", Advanced),
    preset("Morse Code", "1 x 1 1 x x 1 x 1 1 x", "Dots and dashes", Rhythmic),
    preset("Fibonacci", "1 1 2 3 2 1 3 4", "Growing sequence", Advanced),
    preset("Pendulum", "1 3 2 4 3 1 2 4 3 2", "Swinging back and forth", Advanced),
    preset("Stutter Step", "1 1 x 2 2 x 3 3 x", "Doubled notes with gaps", Rhythmic),
    preset("Call Response", "1 x x 3 2 x x 4", "Question and answer", Rhythmic),
    preset("Spiral", "1 2 4 3 1 4 2 3", "Winding through the chord", Advanced),
    preset("Latin Clave", "1 x x 1 x 1 x x", "Clave-style accents", Rhythmic),
    preset(
        "Long Journey",
        "1 2 x 3 4 x 3 2 1 x 2 3 4 x x 1",
        "Sixteen-step wandering line",
        Advanced,
    ),
    preset("Minimalist", "1 x x x x x x x", "One note, lots of space", Basic),
    preset("Maximalist", "1 2 3 4 1+ 2+ 3+ 4+", "Every tone in two octaves", Advanced),
    preset("Ghost Notes", "1 x 2 x x 3 x 4 x x", "Sparse notes between rests", Rhythmic),
    preset("Power Chord", "1 1 1+ 1+", "Root and octave drive", Basic),
    preset("Bossa Nova", "1 x 2 x 3 x 4 2", "Brazilian-style comping", Genre),
    preset("Reggae Skank", "x 2 x 4 x 2 x 4", "Off-beat upstrokes", Genre),
    preset("Tango", "1 x 2 3 x x 4 x", "Tango accompaniment", Genre),
    preset("Swing Feel", "1 x 3 x 2 x 4 x", "Jazz swing comping", Genre),
    preset("Folk Strum", "1 2 3 2 1 2 3 2", "Fingerpicked folk accompaniment", Genre),
    preset("Extended Jazz", "1 3 5 6 5 3 1 x", "Extended chord tones", Advanced),
    preset("Full House", "1 2 3 4 5 6 x x", "All six notes then rest", Basic),
    preset("Polyrhythmic 6", "1 x 3 x 5 x 2 x 4 x 6 x", "Odd and even tones alternate", Rhythmic),
    preset("Wave Function", "1 3 5 6 4 2 1 3 5 4 2 x", "Rising and falling waves", Advanced),
];

/// Case-insensitive lookup by preset name.
pub fn find(name: &str) -> Option<&'static PatternPreset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

pub fn by_category(category: PatternCategory) -> impl Iterator<Item = &'static PatternPreset> {
    PRESETS.iter().filter(move |p| p.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_parses() {
        for p in PRESETS {
            assert!(p.pattern().is_ok(), "preset {} failed to parse", p.name);
        }
    }

    #[test]
    fn test_find_case_insensitive() {
        let p = find("alberti bass").unwrap();
        assert_eq!(p.notation, "1 3 2 3 1 3 2 3");
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_every_category_has_presets() {
        for c in PatternCategory::ALL {
            assert!(by_category(c).count() > 0, "{} empty", c.name());
        }
    }
}
