//! AudioSideEffect: audio operations produced by dispatchers.
//!
//! Dispatch functions push side effects into a `Vec<AudioSideEffect>`
//! instead of calling `AudioHandle` directly; the caller applies them after
//! dispatch returns.

use chordloop_audio::AudioHandle;
use chordloop_types::{NoteSet, Pattern, PatternTarget, Pitch};

use crate::state::AppState;

/// A deferred audio operation. Variants map 1:1 to `AudioHandle` methods.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSideEffect {
    // ── State sync ──
    /// Push the current selection and sequence.
    SyncSelection,
    /// Push the current playback settings.
    SyncSettings,
    SetPattern {
        target: PatternTarget,
        pattern: Option<Pattern>,
    },

    // ── Transport ──
    Start,
    Stop,
    Toggle,
    SetTempo(f32),
    PlayScale(NoteSet),
    StopScale,
    ToggleScale(NoteSet),

    // ── Manual notes ──
    NoteOn(Pitch),
    NoteOff(Pitch),
    ReleaseAll,
}

/// Apply effects in order. Sync effects read `state` as it is now.
pub fn apply_side_effects(effects: &[AudioSideEffect], state: &AppState, audio: &AudioHandle) {
    for effect in effects {
        apply_one(effect, state, audio);
    }
}

fn apply_one(effect: &AudioSideEffect, state: &AppState, audio: &AudioHandle) {
    match effect {
        AudioSideEffect::SyncSelection => audio.update_snapshot(&state.selection, &state.sequence),
        AudioSideEffect::SyncSettings => audio.update_settings(&state.settings),
        AudioSideEffect::SetPattern { target, pattern } => {
            audio.set_pattern(*target, pattern.clone())
        }

        AudioSideEffect::Start => audio.start(),
        AudioSideEffect::Stop => audio.stop(),
        AudioSideEffect::Toggle => audio.toggle(),
        AudioSideEffect::SetTempo(bpm) => audio.set_tempo(*bpm),
        AudioSideEffect::PlayScale(notes) => audio.play_scale(notes),
        AudioSideEffect::StopScale => audio.stop_scale(),
        AudioSideEffect::ToggleScale(notes) => audio.toggle_scale(notes),

        AudioSideEffect::NoteOn(pitch) => audio.note_on(*pitch),
        AudioSideEffect::NoteOff(pitch) => audio.note_off(*pitch),
        AudioSideEffect::ReleaseAll => audio.release_all(),
    }
}
