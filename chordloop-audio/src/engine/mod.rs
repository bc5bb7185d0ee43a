//! The pattern engine: transport, step scheduling and voice bookkeeping.
//!
//! All timers live in the engine itself (`next_tick_at`, pending voice
//! releases, the scale run), so `stop()` cancels everything by clearing
//! them. Every method takes the current time explicitly; the audio thread
//! passes `Instant::now()` and tests pass a virtual clock.

pub mod backend;
pub mod midi_out;
pub(crate) mod scale_run;
pub mod voices;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chordloop_types::selection::{resolve, resolve_active_pattern, resolve_source};
use chordloop_types::transport::{clamp_bpm, step_interval};
use chordloop_types::{
    ActiveSource, NoteSet, Pattern, PatternBindings, PatternTarget, Pitch, PlaybackSettings,
    Subdivision, TransportSnapshot, TransportState,
};

use crate::snapshot::SelectionSnapshot;
use backend::AudioBackend;
use scale_run::{ScaleRun, ScaleStep, SCALE_LEAD_IN};
use voices::VoiceTracker;

pub const MAX_SWING: f32 = 0.5;

/// Fixed engine parameters, read from the config file at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub subdivision: Subdivision,
    /// `[0, 0.5]`; 0 keeps every step at the nominal interval.
    pub swing: f32,
    /// Upper bound on how long the audio thread sleeps between polls.
    pub poll_interval: Duration,
    /// How often tick telemetry is summarized.
    pub telemetry_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subdivision: Subdivision::default(),
            swing: 0.0,
            poll_interval: Duration::from_millis(1),
            telemetry_interval: Duration::from_secs(10),
        }
    }
}

/// Kinds of timed events, in the order they fire when due together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Due {
    Release,
    Scale,
    Tick,
}

pub struct PatternEngine {
    backend: Box<dyn AudioBackend>,
    transport: TransportState,
    steps_per_beat: u32,
    swing: f32,
    bindings: PatternBindings,
    settings: PlaybackSettings,
    view: SelectionSnapshot,
    voices: VoiceTracker,
    next_tick_at: Option<Instant>,
    last_source: ActiveSource,
    active_step: Option<usize>,
    scale_run: Option<ScaleRun>,
    /// Manual key presses: pressed pitch -> pitch actually sounded.
    manual: HashMap<Pitch, Pitch>,
}

impl PatternEngine {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: &EngineConfig,
        settings: PlaybackSettings,
        global: Pattern,
    ) -> Self {
        let swing = if config.swing.is_finite() { config.swing.clamp(0.0, MAX_SWING) } else { 0.0 };
        Self {
            backend,
            transport: TransportState::default(),
            steps_per_beat: config.subdivision.steps_per_beat(),
            swing,
            bindings: PatternBindings::new(global),
            settings,
            view: SelectionSnapshot::default(),
            voices: VoiceTracker::new(),
            next_tick_at: None,
            last_source: ActiveSource::Nothing,
            active_step: None,
            scale_run: None,
            manual: HashMap::new(),
        }
    }

    // ── Transport ──

    /// No-op if running. Otherwise step 0 fires immediately.
    pub fn start(&mut self, now: Instant) -> bool {
        if !self.start_at(now) {
            return false;
        }
        self.poll(now);
        true
    }

    /// Start if stopped, stop if running. Returns whether the transport
    /// runs afterwards.
    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.transport.running {
            self.stop();
            false
        } else {
            self.start(now)
        }
    }

    fn start_at(&mut self, now: Instant) -> bool {
        if self.transport.running {
            return false;
        }
        if let Some(run) = self.scale_run.take() {
            if let Some(pitch) = run.sounding() {
                self.backend_release(pitch);
            }
        }
        self.transport.running = true;
        self.transport.current_step = 0;
        self.active_step = None;
        self.last_source = resolve_source(&self.view.selection, &self.view.sequence);
        self.next_tick_at = Some(now);
        log::debug!(target: "audio", "transport started at {} bpm", self.transport.bpm);
        true
    }

    /// Cancel every pending tick, release and scale note, then one
    /// unconditional `release_all`. Idempotent.
    pub fn stop(&mut self) {
        if self.transport.running {
            log::debug!(target: "audio", "transport stopped at step {}", self.transport.current_step);
        }
        self.transport.running = false;
        self.transport.current_step = 0;
        self.next_tick_at = None;
        self.active_step = None;
        self.voices.clear();
        self.scale_run = None;
        self.manual.clear();
        if let Err(e) = self.backend.release_all() {
            log::warn!(target: "audio", "release_all failed on {}: {}", self.backend.name(), e);
        }
    }

    /// Clamp and apply. The already scheduled tick keeps its time; the one
    /// after it uses the new interval.
    pub fn set_tempo(&mut self, bpm: f32) -> f32 {
        if bpm.is_finite() {
            self.transport.bpm = clamp_bpm(bpm);
        }
        self.transport.bpm
    }

    pub fn is_running(&self) -> bool {
        self.transport.running
    }

    pub fn bpm(&self) -> f32 {
        self.transport.bpm
    }

    pub fn current_step(&self) -> u64 {
        self.transport.current_step
    }

    // ── State updates ──

    /// Replace the selection/sequence view. Overrides for entries that no
    /// longer exist are dropped. With sustain off, a change of play target
    /// releases held notes right away.
    pub fn update_snapshot(&mut self, view: SelectionSnapshot) {
        self.view = view;
        let sequence = &self.view.sequence;
        let pruned = self.bindings.retain_entries(|id| sequence.contains_id(id));
        if pruned > 0 {
            log::debug!(target: "audio", "dropped {} pattern override(s) for removed entries", pruned);
        }
        let source = resolve_source(&self.view.selection, &self.view.sequence);
        self.note_source(source);
    }

    pub fn set_settings(&mut self, settings: PlaybackSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Bind or clear a pattern. Phase is kept: the step counter is not reset.
    pub fn set_pattern_for_target(&mut self, target: PatternTarget, pattern: Option<Pattern>) {
        self.bindings.set(target, pattern);
    }

    pub fn bindings(&self) -> &PatternBindings {
        &self.bindings
    }

    fn note_source(&mut self, source: ActiveSource) {
        if !source.same_target(&self.last_source) && self.transport.running && !self.settings.sustain()
        {
            self.release_held();
        }
        self.last_source = source;
    }

    // ── Manual notes ──

    /// A key press. Goes straight to the backend; with sustain off the
    /// engine's held notes are cut first.
    pub fn note_on(&mut self, base: Pitch) {
        let pitch = self.settings.compute_trigger_pitch(base);
        if !self.settings.sustain() {
            self.release_held();
        }
        if let Some(previous) = self.manual.insert(base, pitch) {
            self.backend_release(previous);
        }
        self.backend_trigger(pitch);
    }

    pub fn note_off(&mut self, base: Pitch) {
        let pitch = self
            .manual
            .remove(&base)
            .unwrap_or_else(|| self.settings.compute_trigger_pitch(base));
        self.backend_release(pitch);
    }

    /// Panic: silence the backend. The transport and any scale run keep
    /// going from their next event.
    pub fn release_all(&mut self) {
        self.voices.clear();
        self.manual.clear();
        if let Err(e) = self.backend.release_all() {
            log::warn!(target: "audio", "release_all failed on {}: {}", self.backend.name(), e);
        }
    }

    // ── Scale run ──

    /// Play `notes` one at a time after a short lead-in. A running
    /// transport is stopped and restarted when the run ends. Calling this
    /// while a run is active cancels that run instead.
    pub fn play_scale(&mut self, notes: &NoteSet, now: Instant) -> bool {
        if self.scale_run.is_some() {
            self.stop_scale(now);
            return false;
        }
        if notes.is_empty() {
            return false;
        }
        let resume = self.transport.running;
        if resume {
            self.stop();
        }
        let pitches: Vec<Pitch> = notes.iter().map(|p| self.settings.compute_trigger_pitch(p)).collect();
        let note_len = ScaleRun::note_len_for(self.transport.bpm);
        log::debug!(target: "audio", "scale run of {} notes", pitches.len());
        self.scale_run = Some(ScaleRun::new(pitches, now + SCALE_LEAD_IN, note_len, resume));
        true
    }

    /// Cancel a scale run; the transport comes back if the run stopped it.
    pub fn stop_scale(&mut self, now: Instant) -> bool {
        let Some(run) = self.scale_run.take() else {
            return false;
        };
        if let Some(pitch) = run.sounding() {
            self.backend_release(pitch);
        }
        if run.resume_transport() {
            self.start(now);
        }
        true
    }

    /// Cancel the active run, or start one over `notes` when none is active.
    /// Returns whether a run is active afterwards.
    pub fn toggle_scale(&mut self, notes: &NoteSet, now: Instant) -> bool {
        if self.scale_run.is_some() {
            self.stop_scale(now);
            false
        } else {
            self.play_scale(notes, now)
        }
    }

    pub fn is_scale_running(&self) -> bool {
        self.scale_run.is_some()
    }

    // ── Scheduling ──

    /// Earliest pending event, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        let tick = self.next_tick_at.filter(|_| self.transport.running);
        let release = self.voices.next_release();
        let scale = self.scale_run.as_ref().map(|r| r.next_event_at());
        [tick, release, scale].into_iter().flatten().min()
    }

    /// Fire every event due at or before `now`, earliest first. Returns how
    /// many fired.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some((at, due)) = self.next_due(now) {
            match due {
                Due::Release => {
                    if let Some(voice) = self.voices.pop_due(at) {
                        self.backend_release(voice.pitch);
                    }
                }
                Due::Scale => self.advance_scale(at, now),
                Due::Tick => self.tick(at, now),
            }
            fired += 1;
        }
        fired
    }

    fn next_due(&self, now: Instant) -> Option<(Instant, Due)> {
        let release = self.voices.next_release().map(|t| (t, Due::Release));
        let scale = self.scale_run.as_ref().map(|r| (r.next_event_at(), Due::Scale));
        let tick = self
            .next_tick_at
            .filter(|_| self.transport.running)
            .map(|t| (t, Due::Tick));
        [release, scale, tick]
            .into_iter()
            .flatten()
            .filter(|(t, _)| *t <= now)
            .min()
    }

    /// Length of the step with this counter value. With swing, even steps
    /// are lengthened and odd steps shortened by the same factor.
    fn step_duration(&self, counter: u64) -> Duration {
        let base = step_interval(self.transport.bpm, self.steps_per_beat);
        if self.swing == 0.0 {
            return base;
        }
        let factor = if counter % 2 == 0 { 1.0 + self.swing } else { 1.0 - self.swing };
        base.mul_f64(factor as f64)
    }

    fn tick(&mut self, at: Instant, now: Instant) {
        let source = resolve_source(&self.view.selection, &self.view.sequence);
        self.note_source(source);

        let notes = resolve(&self.view.selection, &self.view.sequence);
        let pattern = resolve_active_pattern(&self.view.selection, &self.view.sequence, &self.bindings);
        let counter = self.transport.current_step;
        let step_len = self.step_duration(counter);
        let slots = pattern.step(counter).expand(notes.len());

        if !slots.is_empty() {
            if !self.settings.sustain() {
                self.release_held();
            }
            let release_at = at + step_len.mul_f64(self.settings.note_duration() as f64);
            let mut fired: Vec<Pitch> = Vec::with_capacity(slots.len());
            for slot in slots {
                let Some(base) = notes.get(slot.index) else {
                    continue;
                };
                let pitch = self.settings.trigger_pitch_with_shift(base, slot.octave_shift);
                if fired.contains(&pitch) {
                    continue;
                }
                fired.push(pitch);
                if self.voices.take(pitch).is_some() {
                    self.backend_release(pitch);
                }
                if self.backend_trigger(pitch) {
                    self.voices.hold(pitch, release_at);
                }
            }
        }

        self.active_step = Some((counter % pattern.len() as u64) as usize);
        self.transport.current_step += 1;

        let mut next = at + step_len;
        if next <= now {
            log::debug!(target: "audio", "tick {} ran late by {:?}, re-anchoring", counter, now - at);
            next = now + step_len;
        }
        self.next_tick_at = Some(next);
    }

    fn advance_scale(&mut self, at: Instant, now: Instant) {
        let step = match self.scale_run.as_mut() {
            Some(run) => run.pop(at),
            None => return,
        };
        match step {
            Some(ScaleStep::Release(pitch)) => self.backend_release(pitch),
            Some(ScaleStep::Trigger(pitch)) => {
                self.backend_trigger(pitch);
            }
            Some(ScaleStep::Finished { resume_transport }) => {
                self.scale_run = None;
                log::debug!(target: "audio", "scale run finished");
                if resume_transport {
                    self.start_at(now);
                }
            }
            None => {}
        }
    }

    fn release_held(&mut self) {
        for pitch in self.voices.take_all() {
            self.backend_release(pitch);
        }
    }

    fn backend_trigger(&self, pitch: Pitch) -> bool {
        match self.backend.trigger(pitch, self.settings.velocity()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(target: "audio", "trigger {} failed on {}: {}", pitch, self.backend.name(), e);
                false
            }
        }
    }

    fn backend_release(&self, pitch: Pitch) {
        if let Err(e) = self.backend.release(pitch) {
            log::warn!(target: "audio", "release {} failed on {}: {}", pitch, self.backend.name(), e);
        }
    }

    // ── Read model ──

    pub fn snapshot(&self) -> TransportSnapshot {
        let pattern = resolve_active_pattern(&self.view.selection, &self.view.sequence, &self.bindings);
        let mut sounding = self.voices.pitches();
        if let Some(p) = self.scale_run.as_ref().and_then(|r| r.sounding()) {
            if !sounding.contains(&p) {
                sounding.push(p);
                sounding.sort();
            }
        }
        TransportSnapshot {
            running: self.transport.running,
            bpm: self.transport.bpm,
            current_step: self.transport.current_step,
            pattern_len: pattern.len(),
            active_step: self.active_step,
            source: resolve_source(&self.view.selection, &self.view.sequence).kind(),
            sounding,
        }
    }

    /// Stop and silence. Called once when the audio thread exits.
    pub fn shutdown(&mut self) {
        self.stop();
        log::info!(target: "audio", "pattern engine shut down");
    }
}

#[cfg(test)]
mod tests;
