//! LocalDispatcher: Dispatcher implementation for local execution.

use chordloop_audio::AudioHandle;
use chordloop_types::{Action, DispatchOutcome, Dispatcher, NoteResolver, Result};

use crate::state::AppState;

use super::dispatch_action;
use super::side_effects::apply_side_effects;

/// Executes actions directly on in-process state and forwards the
/// resulting audio effects to the handle. Feedback is left queued for the
/// caller to drain.
pub struct LocalDispatcher<'a> {
    pub state: &'a mut AppState,
    pub audio: &'a mut AudioHandle,
    pub resolver: &'a dyn NoteResolver,
}

impl<'a> LocalDispatcher<'a> {
    pub fn new(
        state: &'a mut AppState,
        audio: &'a mut AudioHandle,
        resolver: &'a dyn NoteResolver,
    ) -> Self {
        Self { state, audio, resolver }
    }
}

impl<'a> Dispatcher for LocalDispatcher<'a> {
    fn dispatch(&mut self, action: &Action) -> Result<DispatchOutcome> {
        let mut effects = Vec::new();
        let result = dispatch_action(action, self.state, self.resolver, &mut effects);
        apply_side_effects(&effects, self.state, self.audio);
        result
    }
}
