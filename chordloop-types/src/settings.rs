use crate::{Pitch, PitchRange};

pub const OCTAVE_OFFSET_MIN: i8 = -3;
pub const OCTAVE_OFFSET_MAX: i8 = 3;
pub const NOTE_DURATION_MIN: f32 = 0.01;
pub const EQ_GAIN_DB_LIMIT: f32 = 12.0;
pub const DEFAULT_INSTRUMENT: &str = "electric_piano_1";

/// Effect sends, each a level in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Reverb,
    Chorus,
    Delay,
    Distortion,
    Bitcrusher,
    Phaser,
    Flanger,
    RingMod,
    AutoFilter,
    Tremolo,
    StereoWidth,
    Compressor,
}

impl Effect {
    pub const ALL: [Effect; 12] = [
        Effect::Reverb,
        Effect::Chorus,
        Effect::Delay,
        Effect::Distortion,
        Effect::Bitcrusher,
        Effect::Phaser,
        Effect::Flanger,
        Effect::RingMod,
        Effect::AutoFilter,
        Effect::Tremolo,
        Effect::StereoWidth,
        Effect::Compressor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Reverb => "reverb",
            Effect::Chorus => "chorus",
            Effect::Delay => "delay",
            Effect::Distortion => "distortion",
            Effect::Bitcrusher => "bitcrusher",
            Effect::Phaser => "phaser",
            Effect::Flanger => "flanger",
            Effect::RingMod => "ring_mod",
            Effect::AutoFilter => "auto_filter",
            Effect::Tremolo => "tremolo",
            Effect::StereoWidth => "stereo_width",
            Effect::Compressor => "compressor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.name().eq_ignore_ascii_case(name))
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Three-band EQ gains in dB.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EqSettings {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqBand {
    Bass,
    Mid,
    Treble,
}

/// How notes are voiced. Setters clamp and never fail; non-finite input
/// keeps the previous value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    sustain: bool,
    octave_offset: i8,
    note_duration: f32,
    output_level: f32,
    instrument_name: String,
    eq: EqSettings,
    effect_levels: [f32; 12],
    range: PitchRange,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            sustain: false,
            octave_offset: 0,
            note_duration: 0.8,
            output_level: 0.8,
            instrument_name: DEFAULT_INSTRUMENT.to_string(),
            eq: EqSettings::default(),
            effect_levels: [0.0; 12],
            range: PitchRange::PIANO,
        }
    }
}

fn finite_or(value: f32, previous: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        previous
    }
}

impl PlaybackSettings {
    pub fn sustain(&self) -> bool {
        self.sustain
    }

    pub fn octave_offset(&self) -> i8 {
        self.octave_offset
    }

    /// Fraction of a step a triggered note is held for, in `(0, 1]`.
    pub fn note_duration(&self) -> f32 {
        self.note_duration
    }

    pub fn output_level(&self) -> f32 {
        self.output_level
    }

    pub fn instrument_name(&self) -> &str {
        &self.instrument_name
    }

    pub fn eq(&self) -> EqSettings {
        self.eq
    }

    pub fn effect_level(&self, effect: Effect) -> f32 {
        self.effect_levels[effect.slot()]
    }

    pub fn range(&self) -> PitchRange {
        self.range
    }

    pub fn set_sustain(&mut self, sustain: bool) {
        self.sustain = sustain;
    }

    pub fn set_octave_offset(&mut self, offset: i32) {
        self.octave_offset =
            offset.clamp(OCTAVE_OFFSET_MIN as i32, OCTAVE_OFFSET_MAX as i32) as i8;
    }

    pub fn set_note_duration(&mut self, fraction: f32) {
        self.note_duration = finite_or(fraction, self.note_duration).clamp(NOTE_DURATION_MIN, 1.0);
    }

    pub fn set_output_level(&mut self, level: f32) {
        self.output_level = finite_or(level, self.output_level).clamp(0.0, 1.0);
    }

    /// Empty names are ignored.
    pub fn set_instrument_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        let name = name.trim();
        if !name.is_empty() {
            self.instrument_name = name.to_string();
        }
    }

    pub fn set_eq(&mut self, band: EqBand, gain_db: f32) {
        let slot = match band {
            EqBand::Bass => &mut self.eq.bass,
            EqBand::Mid => &mut self.eq.mid,
            EqBand::Treble => &mut self.eq.treble,
        };
        *slot = finite_or(gain_db, *slot).clamp(-EQ_GAIN_DB_LIMIT, EQ_GAIN_DB_LIMIT);
    }

    pub fn set_effect_level(&mut self, effect: Effect, level: f32) {
        let slot = &mut self.effect_levels[effect.slot()];
        *slot = finite_or(level, *slot).clamp(0.0, 1.0);
    }

    pub fn set_range(&mut self, range: PitchRange) {
        self.range = range;
    }

    /// Apply the octave offset, saturating at the instrument range.
    pub fn compute_trigger_pitch(&self, base: Pitch) -> Pitch {
        self.trigger_pitch_with_shift(base, 0)
    }

    /// As `compute_trigger_pitch` with an extra per-step octave shift.
    pub fn trigger_pitch_with_shift(&self, base: Pitch, octave_shift: i8) -> Pitch {
        let octaves = self.octave_offset as i32 + octave_shift as i32;
        self.range.clamp(base.get() as i32 + octaves * 12)
    }

    /// Trigger velocity in `[0, 1]`.
    pub fn velocity(&self) -> f32 {
        self.output_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = PlaybackSettings::default();
        assert!(!s.sustain());
        assert_eq!(s.octave_offset(), 0);
        assert_eq!(s.note_duration(), 0.8);
        assert_eq!(s.output_level(), 0.8);
        assert_eq!(s.instrument_name(), "electric_piano_1");
        for e in Effect::ALL {
            assert_eq!(s.effect_level(e), 0.0);
        }
    }

    #[test]
    fn test_setters_clamp() {
        let mut s = PlaybackSettings::default();
        s.set_octave_offset(9);
        assert_eq!(s.octave_offset(), 3);
        s.set_octave_offset(-9);
        assert_eq!(s.octave_offset(), -3);
        s.set_note_duration(0.0);
        assert_eq!(s.note_duration(), NOTE_DURATION_MIN);
        s.set_note_duration(4.0);
        assert_eq!(s.note_duration(), 1.0);
        s.set_output_level(-1.0);
        assert_eq!(s.output_level(), 0.0);
        s.set_eq(EqBand::Treble, 40.0);
        assert_eq!(s.eq().treble, 12.0);
        s.set_effect_level(Effect::Delay, 2.0);
        assert_eq!(s.effect_level(Effect::Delay), 1.0);
    }

    #[test]
    fn test_non_finite_keeps_previous() {
        let mut s = PlaybackSettings::default();
        s.set_note_duration(0.5);
        s.set_note_duration(f32::NAN);
        assert_eq!(s.note_duration(), 0.5);
        s.set_output_level(f32::INFINITY);
        assert_eq!(s.output_level(), 0.8);
        s.set_effect_level(Effect::Reverb, 0.3);
        s.set_effect_level(Effect::Reverb, f32::NAN);
        assert_eq!(s.effect_level(Effect::Reverb), 0.3);
    }

    #[test]
    fn test_trigger_pitch_offsets_and_saturates() {
        let mut s = PlaybackSettings::default();
        assert_eq!(s.compute_trigger_pitch(Pitch::new(60)), Pitch::new(60));
        s.set_octave_offset(2);
        assert_eq!(s.compute_trigger_pitch(Pitch::new(60)), Pitch::new(84));
        assert_eq!(s.compute_trigger_pitch(Pitch::new(100)), Pitch::new(108));
        s.set_octave_offset(-3);
        assert_eq!(s.compute_trigger_pitch(Pitch::new(40)), Pitch::new(21));
        assert_eq!(s.trigger_pitch_with_shift(Pitch::new(60), 1), Pitch::new(36));
    }

    #[test]
    fn test_instrument_name_ignores_blank() {
        let mut s = PlaybackSettings::default();
        s.set_instrument_name("  ");
        assert_eq!(s.instrument_name(), DEFAULT_INSTRUMENT);
        s.set_instrument_name("harpsichord");
        assert_eq!(s.instrument_name(), "harpsichord");
    }

    #[test]
    fn test_effect_names_round_trip() {
        for e in Effect::ALL {
            assert_eq!(Effect::from_name(e.name()), Some(e));
        }
        assert_eq!(Effect::from_name("RING_MOD"), Some(Effect::RingMod));
    }
}
