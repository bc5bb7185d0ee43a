//! One-shot ascending scale playback.

use std::time::{Duration, Instant};

use chordloop_types::Pitch;

/// Silence before the first scale note.
pub const SCALE_LEAD_IN: Duration = Duration::from_millis(100);
/// Length of each scale note, in beats.
pub const SCALE_NOTE_BEATS: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScaleStep {
    Release(Pitch),
    Trigger(Pitch),
    Finished { resume_transport: bool },
}

/// Notes go one at a time: note `k` sounds from `first_at + k * note_len`
/// until the next one starts.
#[derive(Debug)]
pub(crate) struct ScaleRun {
    pitches: Vec<Pitch>,
    next: usize,
    next_at: Instant,
    note_len: Duration,
    sounding: Option<(Pitch, Instant)>,
    resume_transport: bool,
}

impl ScaleRun {
    pub(crate) fn new(
        pitches: Vec<Pitch>,
        first_at: Instant,
        note_len: Duration,
        resume_transport: bool,
    ) -> Self {
        Self {
            pitches,
            next: 0,
            next_at: first_at,
            note_len,
            sounding: None,
            resume_transport,
        }
    }

    pub(crate) fn note_len_for(bpm: f32) -> Duration {
        Duration::from_secs_f64(60.0 / bpm.max(1.0) as f64 * SCALE_NOTE_BEATS)
    }

    /// When the next step is due.
    pub(crate) fn next_event_at(&self) -> Instant {
        match self.sounding {
            Some((_, release_at)) => release_at,
            None => self.next_at,
        }
    }

    /// Advance one step if it is due at `at`. A release and the following
    /// trigger share a deadline; the release comes first.
    pub(crate) fn pop(&mut self, at: Instant) -> Option<ScaleStep> {
        if let Some((pitch, release_at)) = self.sounding {
            if release_at <= at {
                self.sounding = None;
                return Some(ScaleStep::Release(pitch));
            }
            return None;
        }
        if self.next_at > at {
            return None;
        }
        if self.next >= self.pitches.len() {
            return Some(ScaleStep::Finished { resume_transport: self.resume_transport });
        }
        let pitch = self.pitches[self.next];
        let started = self.next_at;
        self.next += 1;
        self.next_at = started + self.note_len;
        self.sounding = Some((pitch, self.next_at));
        Some(ScaleStep::Trigger(pitch))
    }

    pub(crate) fn sounding(&self) -> Option<Pitch> {
        self.sounding.map(|(p, _)| p)
    }

    pub(crate) fn resume_transport(&self) -> bool {
        self.resume_transport
    }
}
