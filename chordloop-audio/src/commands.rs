//! Command and feedback types for the audio thread.

use chordloop_types::{NoteSet, Pattern, PatternTarget, Pitch, PlaybackSettings, TransportSnapshot};

use crate::snapshot::SelectionSnapshot;
use crate::telemetry::TelemetrySummary;

/// Commands sent from the main thread to the pattern engine.
#[derive(Debug, Clone)]
pub enum AudioCmd {
    // ── State sync ──
    UpdateSnapshot(SelectionSnapshot),
    UpdateSettings(PlaybackSettings),
    SetPattern {
        target: PatternTarget,
        pattern: Option<Pattern>,
    },

    // ── Transport ──
    Start,
    Stop,
    /// Decided against the engine's own running flag.
    Toggle,
    SetTempo(f32),
    PlayScale(NoteSet),
    StopScale,
    /// Stop the active scale run, or play these notes when none is active.
    ToggleScale(NoteSet),

    // ── Manual notes ──
    NoteOn(Pitch),
    NoteOff(Pitch),
    ReleaseAll,

    // ── Lifecycle ──
    Shutdown,
}

impl AudioCmd {
    /// Time-critical commands that skip the normal queue. Transport and
    /// state commands stay on the normal channel so they are applied in
    /// the order they were sent.
    pub fn is_priority(&self) -> bool {
        matches!(self, AudioCmd::NoteOn(_) | AudioCmd::NoteOff(_) | AudioCmd::ReleaseAll)
    }
}

/// Updates sent back from the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioFeedback {
    Transport(TransportSnapshot),
    PlayingChanged(bool),
    BpmUpdate(f32),
    ScaleRunChanged(bool),
    Telemetry(TelemetrySummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_routing() {
        assert!(AudioCmd::NoteOn(Pitch::new(60)).is_priority());
        assert!(AudioCmd::ReleaseAll.is_priority());
        assert!(!AudioCmd::Start.is_priority());
        assert!(!AudioCmd::Toggle.is_priority());
        assert!(!AudioCmd::SetTempo(90.0).is_priority());
        assert!(!AudioCmd::UpdateSnapshot(SelectionSnapshot::default()).is_priority());
        assert!(!AudioCmd::Shutdown.is_priority());
    }
}
