use chordloop_types::{DispatchOutcome, Result, SettingsAction};

use super::side_effects::AudioSideEffect;
use crate::state::AppState;

/// Settings setters clamp and never fail. The change reaches the engine
/// before its next trigger.
pub(super) fn dispatch_settings(
    action: &SettingsAction,
    state: &mut AppState,
    effects: &mut Vec<AudioSideEffect>,
) -> Result<DispatchOutcome> {
    let settings = &mut state.settings;
    match action {
        SettingsAction::SetSustain(on) => settings.set_sustain(*on),
        SettingsAction::ToggleSustain => settings.set_sustain(!settings.sustain()),
        SettingsAction::SetOctaveOffset(offset) => settings.set_octave_offset(*offset),
        SettingsAction::SetNoteDuration(fraction) => settings.set_note_duration(*fraction),
        SettingsAction::SetOutputLevel(level) => settings.set_output_level(*level),
        SettingsAction::SetInstrument(name) => settings.set_instrument_name(name.as_str()),
        SettingsAction::SetEq(band, gain) => settings.set_eq(*band, *gain),
        SettingsAction::SetEffectLevel(effect, level) => settings.set_effect_level(*effect, *level),
    }
    effects.push(AudioSideEffect::SyncSettings);
    Ok(DispatchOutcome::none())
}
