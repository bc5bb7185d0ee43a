//! Decides which note set and which pattern the engine plays.

use serde::{Deserialize, Serialize};

use crate::{EntryId, NoteSet, Pattern, PatternBindings, SequenceStore};

/// The transient preview slot. A present preview always wins, even when
/// it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub temporary_preview: Option<NoteSet>,
}

impl SelectionState {
    pub fn with_preview(set: NoteSet) -> Self {
        Self { temporary_preview: Some(set) }
    }
}

/// Where the playing notes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveSource {
    Preview(NoteSet),
    Saved { id: EntryId, index: usize },
    Nothing,
}

impl ActiveSource {
    /// Same play target. Saved entries compare by id only, so a shift of
    /// the index alone is not a switch.
    pub fn same_target(&self, other: &ActiveSource) -> bool {
        match (self, other) {
            (ActiveSource::Preview(a), ActiveSource::Preview(b)) => a == b,
            (ActiveSource::Saved { id: a, .. }, ActiveSource::Saved { id: b, .. }) => a == b,
            (ActiveSource::Nothing, ActiveSource::Nothing) => true,
            _ => false,
        }
    }

    pub fn kind(&self) -> crate::SourceKind {
        match self {
            ActiveSource::Preview(_) => crate::SourceKind::Preview,
            ActiveSource::Saved { index, .. } => crate::SourceKind::Saved(*index),
            ActiveSource::Nothing => crate::SourceKind::Nothing,
        }
    }
}

pub fn resolve_source(selection: &SelectionState, store: &SequenceStore) -> ActiveSource {
    if let Some(preview) = &selection.temporary_preview {
        return ActiveSource::Preview(preview.clone());
    }
    match store.selected_index() {
        Some(index) => match store.id_at(index) {
            Some(id) => ActiveSource::Saved { id, index },
            None => ActiveSource::Nothing,
        },
        None => ActiveSource::Nothing,
    }
}

/// Preview if present, else the selected entry if in bounds, else empty.
pub fn resolve(selection: &SelectionState, store: &SequenceStore) -> NoteSet {
    if let Some(preview) = &selection.temporary_preview {
        return preview.clone();
    }
    store.selected_entry().map(|e| e.note_set.clone()).unwrap_or_default()
}

/// The selected entry's binding if it has one, else the global default.
/// A preview has no binding target and plays the global pattern.
pub fn resolve_active_pattern(
    selection: &SelectionState,
    store: &SequenceStore,
    bindings: &PatternBindings,
) -> Pattern {
    match resolve_source(selection, store) {
        ActiveSource::Saved { id, .. } => bindings.for_entry(id).clone(),
        _ => bindings.global().clone(),
    }
}
