//! Action types for the dispatch system.
//!
//! Actions represent user intents. The front end builds them; the core
//! dispatcher validates them, mutates state and forwards commands to the
//! audio thread.

use crate::{Effect, EqBand, NoteSet, Pattern, PatternTarget, Pitch, SequenceEntry};

#[derive(Debug, Clone, PartialEq)]
pub enum TransportAction {
    Start,
    Stop,
    Toggle,
    SetTempo(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionAction {
    /// Show (or clear, with `None`) the temporary preview.
    Preview(Option<NoteSet>),
    /// Resolve a chord name in the current key and preview it.
    PreviewChord(String),
    Select(Option<usize>),
    /// Step the selection forward, wrapping; selects 0 when nothing is.
    SelectNext,
    SelectPrevious,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceAction {
    /// Resolve a chord name in the current key/mode and append it.
    AddChord(String),
    Add(SequenceEntry),
    Remove(usize),
    Clear,
    Replace { index: usize, entry: SequenceEntry },
    /// Re-resolve an entry's name against the current key and mode.
    Refresh(usize),
    Move { from: usize, to: usize },
    /// Replace an entry's notes with typed pitch names (`"E3, C4 G4"`).
    EditNotes { index: usize, notes: String },
    /// Reorder one note inside an entry's voicing.
    MoveNote { index: usize, from: usize, to: usize },
    /// Put back the library voicing for the entry's name in its own key.
    ResetNotes(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternAction {
    Set { target: PatternTarget, pattern: Option<Pattern> },
    SetNotation { target: PatternTarget, notation: String },
    ApplyPreset { target: PatternTarget, name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    SetSustain(bool),
    ToggleSustain,
    SetOctaveOffset(i32),
    SetNoteDuration(f32),
    SetOutputLevel(f32),
    SetInstrument(String),
    SetEq(EqBand, f32),
    SetEffectLevel(Effect, f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteAction {
    On(Pitch),
    Off(Pitch),
    /// Play the current key's mode as an ascending run.
    PlayScale,
    StopScale,
    ToggleScale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContextAction {
    SetKey(String),
    SetMode(String),
}

/// Top-level intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Transport(TransportAction),
    Selection(SelectionAction),
    Sequence(SequenceAction),
    Pattern(PatternAction),
    Settings(SettingsAction),
    Note(NoteAction),
    Context(ContextAction),
}

impl Action {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Transport(_) => "transport",
            Action::Selection(_) => "selection",
            Action::Sequence(_) => "sequence",
            Action::Pattern(_) => "pattern",
            Action::Settings(_) => "settings",
            Action::Note(_) => "note",
            Action::Context(_) => "context",
        }
    }
}
