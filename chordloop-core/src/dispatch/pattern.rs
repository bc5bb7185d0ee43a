use chordloop_types::presets;
use chordloop_types::{
    ChordloopError, DispatchOutcome, Pattern, PatternAction, PatternTarget, Result,
};

use super::side_effects::AudioSideEffect;
use crate::state::AppState;

pub(super) fn dispatch_pattern(
    action: &PatternAction,
    state: &mut AppState,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    match action {
        PatternAction::Set { target, pattern } => {
            bind(state, *target, pattern.clone(), effects)?;
            Ok(DispatchOutcome::none())
        }
        PatternAction::SetNotation { target, notation } => {
            let pattern = Pattern::parse(notation)?;
            bind(state, *target, Some(pattern), effects)?;
            Ok(DispatchOutcome::none())
        }
        PatternAction::ApplyPreset { target, name } => {
            let preset = presets::find(name)
                .ok_or_else(|| ChordloopError::NotFound(format!("pattern preset {:?}", name)))?;
            bind(state, *target, Some(preset.pattern()?), effects)?;
            Ok(DispatchOutcome::with_status(format!("{}: {}", preset.name, preset.notation)))
        }
    }
}

fn bind(
    state: &mut AppState,
    target: PatternTarget,
    pattern: Option<Pattern>,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<()> {
    if let PatternTarget::Entry(id) = target {
        if !state.sequence.contains_id(id) {
            return Err(ChordloopError::NotFound(format!("sequence entry {}", id)));
        }
    }
    state.bindings.set(target, pattern.clone());
    effects.push(AudioSideEffect::SetPattern { target, pattern });
    Ok(())
}
