use chordloop_types::{DispatchOutcome, NoteResolver, Result, SelectionAction};

use super::side_effects::AudioSideEffect;
use crate::state::AppState;

pub(super) fn dispatch_selection(
    action: &SelectionAction,
    state: &mut AppState,
    resolver: &dyn NoteResolver,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    match action {
        SelectionAction::Preview(set) => {
            state.selection.temporary_preview = set.clone();
        }
        SelectionAction::PreviewChord(name) => {
            let notes = match resolver.lookup(name, state.key.name()) {
                Ok(notes) => notes,
                Err(e) => {
                    log::warn!(target: "dispatch", "preview {:?}: {}", name, e);
                    Default::default()
                }
            };
            state.selection.temporary_preview = Some(notes);
        }
        SelectionAction::Select(index) => {
            state.sequence.select(*index)?;
        }
        SelectionAction::SelectNext => {
            let len = state.sequence.len();
            if len == 0 {
                return Ok(DispatchOutcome::none());
            }
            let next = match state.sequence.selected_index() {
                Some(i) => (i + 1) % len,
                None => 0,
            };
            state.sequence.select(Some(next))?;
        }
        SelectionAction::SelectPrevious => {
            let len = state.sequence.len();
            if len == 0 {
                return Ok(DispatchOutcome::none());
            }
            let prev = match state.sequence.selected_index() {
                Some(0) | None => len - 1,
                Some(i) => i - 1,
            };
            state.sequence.select(Some(prev))?;
        }
    }
    effects.push(AudioSideEffect::SyncSelection);
    Ok(DispatchOutcome::none())
}
