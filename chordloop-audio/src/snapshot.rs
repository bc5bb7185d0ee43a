use chordloop_types::{SelectionState, SequenceStore};

/// The audio thread's copy of what the user picked: the preview slot plus
/// the saved sequence (which carries the selected index).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSnapshot {
    pub selection: SelectionState,
    pub sequence: SequenceStore,
}

impl SelectionSnapshot {
    pub fn new(selection: SelectionState, sequence: SequenceStore) -> Self {
        Self { selection, sequence }
    }
}
