//! Bookkeeping for pitches the engine triggered and still has to release.

use std::time::Instant;

use chordloop_types::Pitch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldVoice {
    pub pitch: Pitch,
    pub release_at: Instant,
}

/// Pending releases. One entry per pitch.
#[derive(Debug, Default)]
pub struct VoiceTracker {
    voices: Vec<HeldVoice>,
}

impl VoiceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a held pitch, replacing any earlier release time for it.
    pub fn hold(&mut self, pitch: Pitch, release_at: Instant) {
        match self.voices.iter_mut().find(|v| v.pitch == pitch) {
            Some(v) => v.release_at = release_at,
            None => self.voices.push(HeldVoice { pitch, release_at }),
        }
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.voices.iter().any(|v| v.pitch == pitch)
    }

    pub fn take(&mut self, pitch: Pitch) -> Option<HeldVoice> {
        let idx = self.voices.iter().position(|v| v.pitch == pitch)?;
        Some(self.voices.swap_remove(idx))
    }

    /// Remove and return the earliest voice due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<HeldVoice> {
        let idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.release_at <= now)
            .min_by_key(|(_, v)| v.release_at)
            .map(|(i, _)| i)?;
        Some(self.voices.swap_remove(idx))
    }

    /// Remove everything, earliest release first.
    pub fn take_all(&mut self) -> Vec<Pitch> {
        self.voices.sort_by_key(|v| v.release_at);
        self.voices.drain(..).map(|v| v.pitch).collect()
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    pub fn next_release(&self) -> Option<Instant> {
        self.voices.iter().map(|v| v.release_at).min()
    }

    /// Held pitches, ascending.
    pub fn pitches(&self) -> Vec<Pitch> {
        let mut out: Vec<Pitch> = self.voices.iter().map(|v| v.pitch).collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_hold_replaces_release_time() {
        let t0 = Instant::now();
        let mut v = VoiceTracker::new();
        v.hold(Pitch::new(60), t0 + Duration::from_millis(100));
        v.hold(Pitch::new(60), t0 + Duration::from_millis(300));
        assert_eq!(v.len(), 1);
        assert_eq!(v.next_release(), Some(t0 + Duration::from_millis(300)));
    }

    #[test]
    fn test_pop_due_in_time_order() {
        let t0 = Instant::now();
        let mut v = VoiceTracker::new();
        v.hold(Pitch::new(67), t0 + Duration::from_millis(30));
        v.hold(Pitch::new(60), t0 + Duration::from_millis(10));
        v.hold(Pitch::new(64), t0 + Duration::from_millis(500));

        let now = t0 + Duration::from_millis(40);
        assert_eq!(v.pop_due(now).map(|h| h.pitch), Some(Pitch::new(60)));
        assert_eq!(v.pop_due(now).map(|h| h.pitch), Some(Pitch::new(67)));
        assert_eq!(v.pop_due(now), None);
        assert!(v.contains(Pitch::new(64)));
    }

    #[test]
    fn test_take_and_take_all() {
        let t0 = Instant::now();
        let mut v = VoiceTracker::new();
        v.hold(Pitch::new(72), t0 + Duration::from_millis(20));
        v.hold(Pitch::new(48), t0 + Duration::from_millis(10));
        assert!(v.take(Pitch::new(50)).is_none());
        assert_eq!(v.pitches(), vec![Pitch::new(48), Pitch::new(72)]);
        assert_eq!(v.take_all(), vec![Pitch::new(48), Pitch::new(72)]);
        assert!(v.is_empty());
        assert_eq!(v.next_release(), None);
    }
}
