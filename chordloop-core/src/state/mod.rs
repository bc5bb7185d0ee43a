//! Main-thread application state.

use chordloop_types::music::{Key, Mode};
use chordloop_types::transport::DEFAULT_BPM;
use chordloop_types::{
    NoteSet, Pattern, PatternBindings, PlaybackSettings, SelectionState, SequenceStore,
};

use crate::config::SessionDefaults;

/// Everything the intent layer owns. The audio thread gets copies of the
/// sequence, selection, settings and bindings; the transport itself lives
/// on the audio thread and is read back through `AudioReadState`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub sequence: SequenceStore,
    pub selection: SelectionState,
    pub settings: PlaybackSettings,
    /// Mirror of the engine's pattern bindings, kept in step by dispatch.
    pub bindings: PatternBindings,
    /// Key and mode new chords and the scale run are resolved in.
    pub key: Key,
    pub mode: Mode,
    /// Last tempo requested from the engine.
    pub bpm: f32,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            sequence: SequenceStore::new(),
            selection: SelectionState::default(),
            settings: PlaybackSettings::default(),
            bindings: PatternBindings::new(Pattern::default_global()),
            key: Key::C,
            mode: Mode::Major,
            bpm: DEFAULT_BPM,
        }
    }

    pub fn new_with_defaults(defaults: SessionDefaults) -> Self {
        Self {
            sequence: SequenceStore::new(),
            selection: SelectionState::default(),
            settings: defaults.settings,
            bindings: PatternBindings::new(defaults.pattern),
            key: defaults.key,
            mode: defaults.mode,
            bpm: defaults.bpm,
        }
    }

    /// The current mode in the current key, plus the tonic an octave up.
    pub fn scale_run_notes(&self) -> NoteSet {
        let mut notes = crate::resolver::IntervalResolver::scale(self.key, self.mode);
        if let Some(tonic) = notes.get(0).and_then(|p| p.offset(12)) {
            notes.push(tonic);
        }
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_run_notes_end_on_octave() {
        let mut state = AppState::new();
        state.key = Key::A;
        state.mode = Mode::MinorPentatonic;
        let midi: Vec<u8> = state.scale_run_notes().iter().map(|p| p.get()).collect();
        assert_eq!(midi, vec![69, 72, 74, 76, 79, 81]);
    }
}
