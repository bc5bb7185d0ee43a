//! Drives a progression: one pattern pass per chord, advancing the
//! selection when the active pattern wraps.

use std::thread;
use std::time::{Duration, Instant};

use chordloop_audio::AudioFeedback;
use chordloop_core::dispatch::LocalDispatcher;
use chordloop_types::transport::step_interval;
use chordloop_types::{
    Action, Dispatcher, NoteAction, Result, SelectionAction, Subdivision, TransportAction,
    TransportSnapshot,
};

const POLL: Duration = Duration::from_millis(5);
/// Upper bound on waiting for a scale run to report back.
const SCALE_TIMEOUT: Duration = Duration::from_secs(30);

/// Counts finished pattern passes from transport snapshots.
///
/// A pass ends on the tick that fires the pattern's last step. Each tick is
/// counted once even when several snapshots report it.
#[derive(Debug, Default)]
pub struct PassCounter {
    last_step: Option<u64>,
    passes: u32,
}

impl PassCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `snapshot` closes a pass not seen before.
    pub fn observe(&mut self, snapshot: &TransportSnapshot) -> bool {
        if !snapshot.running || snapshot.pattern_len == 0 {
            return false;
        }
        if self.last_step == Some(snapshot.current_step) {
            return false;
        }
        self.last_step = Some(snapshot.current_step);
        if snapshot.active_step == Some(snapshot.pattern_len - 1) {
            self.passes += 1;
            return true;
        }
        false
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }
}

/// Play `chords` entries `loops` times over, then stop. The sequence is
/// expected to be selected at its first entry.
pub fn play_progression(
    dispatcher: &mut LocalDispatcher<'_>,
    chords: usize,
    loops: u32,
    subdivision: Subdivision,
) -> Result<()> {
    let total = (chords as u32).saturating_mul(loops.max(1));
    let mut counter = PassCounter::new();
    announce(dispatcher);
    dispatcher.dispatch(&Action::Transport(TransportAction::Start))?;

    while counter.passes() < total {
        thread::sleep(POLL);
        let mut wrapped = false;
        for feedback in dispatcher.audio.drain_feedback() {
            if let AudioFeedback::Transport(snapshot) = feedback {
                wrapped |= counter.observe(&snapshot);
            }
        }
        if !wrapped || counter.passes() >= total {
            continue;
        }
        dispatcher.dispatch(&Action::Selection(SelectionAction::SelectNext))?;
        announce(dispatcher);
    }

    // let the last step ring for its full length
    thread::sleep(step_interval(dispatcher.state.bpm, subdivision.steps_per_beat()));
    dispatcher.dispatch(&Action::Transport(TransportAction::Stop))?;
    log::info!(target: "audio", "progression finished after {} passes", counter.passes());
    Ok(())
}

/// Play the scale of the current key and mode and wait for it to end.
pub fn play_scale(dispatcher: &mut LocalDispatcher<'_>) -> Result<()> {
    let notes = dispatcher.state.scale_run_notes();
    println!(
        "{} {}: {}",
        dispatcher.state.key.name(),
        dispatcher.state.mode.name(),
        notes.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" ")
    );
    dispatcher.dispatch(&Action::Note(NoteAction::PlayScale))?;

    let started = Instant::now();
    let mut seen_running = false;
    while started.elapsed() < SCALE_TIMEOUT {
        thread::sleep(POLL);
        dispatcher.audio.drain_feedback();
        let running = dispatcher.audio.read_state().scale_running;
        if running {
            seen_running = true;
        } else if seen_running {
            return Ok(());
        }
    }
    log::warn!(target: "audio", "scale run did not finish within {:?}", SCALE_TIMEOUT);
    dispatcher.dispatch(&Action::Note(NoteAction::StopScale))?;
    Ok(())
}

fn announce(dispatcher: &LocalDispatcher<'_>) {
    let sequence = &dispatcher.state.sequence;
    if let Some((index, entry)) = sequence.selected_index().and_then(|i| sequence.get(i).map(|e| (i, e))) {
        let notes: Vec<String> = entry.note_set.iter().map(|p| p.to_string()).collect();
        println!("[{}/{}] {:<10} {}", index + 1, sequence.len(), entry.name, notes.join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(current_step: u64, active_step: usize, pattern_len: usize) -> TransportSnapshot {
        TransportSnapshot {
            running: true,
            current_step,
            pattern_len,
            active_step: Some(active_step),
            ..Default::default()
        }
    }

    #[test]
    fn test_pass_counter_counts_wraps_once() {
        let mut c = PassCounter::new();
        assert!(!c.observe(&snap(1, 0, 4)));
        assert!(!c.observe(&snap(2, 1, 4)));
        assert!(!c.observe(&snap(3, 2, 4)));
        assert!(c.observe(&snap(4, 3, 4)));
        // republished snapshot of the same tick
        assert!(!c.observe(&snap(4, 3, 4)));
        assert_eq!(c.passes(), 1);
        assert!(!c.observe(&snap(5, 0, 4)));
    }

    #[test]
    fn test_pass_counter_ignores_stopped_and_empty() {
        let mut c = PassCounter::new();
        let mut stopped = snap(4, 3, 4);
        stopped.running = false;
        assert!(!c.observe(&stopped));
        assert!(!c.observe(&TransportSnapshot { running: true, ..Default::default() }));
        assert_eq!(c.passes(), 0);
    }

    #[test]
    fn test_single_step_pattern_wraps_every_tick() {
        let mut c = PassCounter::new();
        assert!(c.observe(&snap(1, 0, 1)));
        assert!(c.observe(&snap(2, 0, 1)));
        assert_eq!(c.passes(), 2);
    }
}
