use chordloop_types::music::parse_pitch_name;
use chordloop_types::{
    ChordloopError, DispatchOutcome, NoteResolver, NoteSet, Result, SequenceAction, SequenceEntry,
};

use super::side_effects::AudioSideEffect;
use crate::state::AppState;

/// Resolve `name` in the current key. A miss is logged and gives an empty set.
fn resolve_entry(name: &str, state: &AppState, resolver: &dyn NoteResolver) -> SequenceEntry {
    let key = state.key.name();
    let notes = match resolver.lookup(name, key) {
        Ok(notes) => notes,
        Err(e) => {
            log::warn!(target: "dispatch", "no notes for {:?} in {}: {}", name, key, e);
            NoteSet::empty()
        }
    };
    SequenceEntry::new(name, notes, key, state.mode.name())
}

pub(super) fn dispatch_sequence(
    action: &SequenceAction,
    state: &mut AppState,
    resolver: &dyn NoteResolver,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    let outcome = match action {
        SequenceAction::AddChord(name) => {
            let entry = resolve_entry(name, state, resolver);
            let empty = entry.note_set.is_empty();
            let index = state.sequence.add(entry);
            let mut outcome = DispatchOutcome::added(index);
            if empty {
                outcome.status = Some(format!("no notes found for {}", name));
            }
            outcome
        }
        SequenceAction::Add(entry) => DispatchOutcome::added(state.sequence.add(entry.clone())),
        SequenceAction::Remove(index) => {
            let removed = state.sequence.remove_at(*index)?;
            prune_bindings(state);
            DispatchOutcome::with_status(format!("removed {}", removed.name))
        }
        SequenceAction::Clear => {
            state.sequence.clear();
            prune_bindings(state);
            DispatchOutcome::none()
        }
        SequenceAction::Replace { index, entry } => {
            state.sequence.replace_at(*index, entry.clone())?;
            DispatchOutcome::none()
        }
        SequenceAction::Refresh(index) => {
            let name = entry_at(state, *index)?.name;
            let entry = resolve_entry(&name, state, resolver);
            state.sequence.replace_at(*index, entry)?;
            DispatchOutcome::none()
        }
        SequenceAction::Move { from, to } => {
            state.sequence.move_entry(*from, *to)?;
            DispatchOutcome::none()
        }
        SequenceAction::EditNotes { index, notes } => {
            let note_set = parse_note_names(notes)?;
            let mut entry = entry_at(state, *index)?;
            entry.note_set = note_set;
            state.sequence.replace_at(*index, entry)?;
            DispatchOutcome::none()
        }
        SequenceAction::MoveNote { index, from, to } => {
            let mut entry = entry_at(state, *index)?;
            let len = entry.note_set.len();
            if !entry.note_set.move_pitch(*from, *to) {
                return Err(ChordloopError::OutOfRange { index: (*from).max(*to), len });
            }
            state.sequence.replace_at(*index, entry)?;
            DispatchOutcome::none()
        }
        SequenceAction::ResetNotes(index) => {
            let mut entry = entry_at(state, *index)?;
            entry.note_set = resolver.lookup(&entry.name, &entry.source_key)?;
            state.sequence.replace_at(*index, entry)?;
            DispatchOutcome::none()
        }
    };
    effects.push(AudioSideEffect::SyncSelection);
    Ok(outcome)
}

fn entry_at(state: &AppState, index: usize) -> Result<SequenceEntry> {
    state
        .sequence
        .get(index)
        .cloned()
        .ok_or(ChordloopError::OutOfRange { index, len: state.sequence.len() })
}

/// Comma- or space-separated pitch names, kept in the order typed. Repeats
/// collapse to the first occurrence.
fn parse_note_names(text: &str) -> Result<NoteSet> {
    let mut notes = NoteSet::empty();
    for token in text.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        let pitch = parse_pitch_name(token).ok_or_else(|| {
            ChordloopError::InvalidConfiguration(format!("bad note name {:?}", token))
        })?;
        notes.push(pitch);
    }
    if notes.is_empty() {
        return Err(ChordloopError::InvalidConfiguration("no notes given".into()));
    }
    Ok(notes)
}

/// Drop mirrored overrides for entries that are gone. The engine prunes
/// its own copy when the snapshot arrives.
fn prune_bindings(state: &mut AppState) {
    let sequence = &state.sequence;
    state.bindings.retain_entries(|id| sequence.contains_id(id));
}
