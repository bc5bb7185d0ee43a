mod local;
mod pattern;
mod selection;
mod sequence;
mod settings;
pub mod side_effects;

pub use local::LocalDispatcher;
pub use side_effects::{apply_side_effects, AudioSideEffect};

use chordloop_types::music::{transpose_steps, Key, Mode};
use chordloop_types::transport::clamp_bpm;
use chordloop_types::{
    Action, ChordloopError, ContextAction, DispatchOutcome, NoteAction, NoteResolver, NoteSet,
    Result, TransportAction,
};

use crate::state::AppState;

/// Dispatch an action against `state`.
///
/// Audio writes are collected into `effects` rather than executed inline;
/// the caller applies them after dispatch returns (see `LocalDispatcher`).
/// Toggles are decided on the audio thread, so dispatch never reads the
/// audio-owned state.
///
/// An `Err` leaves `state` unchanged and pushes no effects.
pub fn dispatch_action(
    action: &Action,
    state: &mut AppState,
    resolver: &dyn NoteResolver,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    let result = match action {
        Action::Transport(a) => dispatch_transport(a, state, effects),
        Action::Selection(a) => selection::dispatch_selection(a, state, resolver, effects),
        Action::Sequence(a) => sequence::dispatch_sequence(a, state, resolver, effects),
        Action::Pattern(a) => pattern::dispatch_pattern(a, state, effects),
        Action::Settings(a) => settings::dispatch_settings(a, state, effects),
        Action::Note(a) => dispatch_note(a, state, effects),
        Action::Context(a) => dispatch_context(a, state, effects),
    };
    if let Err(e) = &result {
        log::debug!(target: "dispatch", "{} action rejected: {}", action.kind(), e);
    }
    result
}

fn dispatch_transport(
    action: &TransportAction,
    state: &mut AppState,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    match action {
        TransportAction::Start => effects.push(AudioSideEffect::Start),
        TransportAction::Stop => effects.push(AudioSideEffect::Stop),
        TransportAction::Toggle => effects.push(AudioSideEffect::Toggle),
        TransportAction::SetTempo(bpm) => {
            if !bpm.is_finite() {
                return Ok(DispatchOutcome::none());
            }
            state.bpm = clamp_bpm(*bpm);
            effects.push(AudioSideEffect::SetTempo(state.bpm));
            return Ok(DispatchOutcome::with_status(format!("{} bpm", state.bpm)));
        }
    }
    Ok(DispatchOutcome::none())
}

fn dispatch_note(
    action: &NoteAction,
    state: &mut AppState,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    match action {
        NoteAction::On(pitch) => effects.push(AudioSideEffect::NoteOn(*pitch)),
        NoteAction::Off(pitch) => effects.push(AudioSideEffect::NoteOff(*pitch)),
        NoteAction::PlayScale => return Ok(play_scale(state, effects)),
        NoteAction::StopScale => effects.push(AudioSideEffect::StopScale),
        NoteAction::ToggleScale => {
            effects.push(AudioSideEffect::ToggleScale(state.scale_run_notes()));
        }
    }
    Ok(DispatchOutcome::none())
}

fn play_scale(state: &AppState, effects: &mut Vec<AudioSideEffect>) -> DispatchOutcome {
    let notes: NoteSet = state.scale_run_notes();
    effects.push(AudioSideEffect::PlayScale(notes));
    DispatchOutcome::with_status(format!("{} {}", state.key, state.mode))
}

fn dispatch_context(
    action: &ContextAction,
    state: &mut AppState,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    match action {
        ContextAction::SetKey(name) => {
            let key = Key::parse(name)
                .ok_or_else(|| ChordloopError::InvalidConfiguration(format!("unknown key {:?}", name)))?;
            let moved = transpose_sequence(state, key)?;
            state.key = key;
            if moved == 0 {
                return Ok(DispatchOutcome::with_status(format!("key {}", key)));
            }
            effects.push(AudioSideEffect::SyncSelection);
            Ok(DispatchOutcome::with_status(format!("key {}, {} transposed", key, moved)))
        }
        ContextAction::SetMode(name) => {
            let mode = Mode::from_name(name)
                .ok_or_else(|| ChordloopError::InvalidConfiguration(format!("unknown mode {:?}", name)))?;
            state.mode = mode;
            // notes stay; only the label follows the new mode
            for index in 0..state.sequence.len() {
                if let Some(entry) = state.sequence.get(index) {
                    let mut entry = entry.clone();
                    entry.source_mode = mode.name().to_string();
                    state.sequence.replace_at(index, entry)?;
                }
            }
            Ok(DispatchOutcome::with_status(format!("mode {}", mode)))
        }
    }
}

/// Move every saved entry into `key`, each by the shortest distance from
/// the key it was resolved in. Returns how many entries changed.
fn transpose_sequence(state: &mut AppState, key: Key) -> Result<usize> {
    let mut moved = 0;
    for index in 0..state.sequence.len() {
        let Some(entry) = state.sequence.get(index) else {
            continue;
        };
        if entry.source_key == key.name() {
            continue;
        }
        let from = Key::parse(&entry.source_key).unwrap_or(state.key);
        let transposed = entry.transposed(transpose_steps(from, key), key.name());
        state.sequence.replace_at(index, transposed)?;
        moved += 1;
    }
    if moved > 0 {
        log::debug!(target: "dispatch", "transposed {} entries into {}", moved, key);
    }
    Ok(moved)
}
