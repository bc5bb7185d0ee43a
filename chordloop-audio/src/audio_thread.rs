use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};

use chordloop_types::TransportSnapshot;

use super::commands::{AudioCmd, AudioFeedback};
use super::engine::{EngineConfig, PatternEngine};
use super::telemetry::LoopTelemetry;

/// Sleep bound when nothing is scheduled; commands still wake the loop.
const IDLE_WAIT: Duration = Duration::from_millis(50);

pub(crate) struct AudioThread {
    engine: PatternEngine,
    /// Priority commands: manual note on/off, panic
    priority_rx: Receiver<AudioCmd>,
    /// Normal commands: state sync, transport
    normal_rx: Receiver<AudioCmd>,
    feedback_tx: Sender<AudioFeedback>,
    poll_interval: Duration,
    telemetry: LoopTelemetry,
    telemetry_interval: Duration,
    last_telemetry_emit: Instant,
    last_snapshot: Option<TransportSnapshot>,
    last_running: bool,
    last_scale_running: bool,
    /// Something changed since the last publish.
    dirty: bool,
}

impl AudioThread {
    pub(crate) fn new(
        engine: PatternEngine,
        config: &EngineConfig,
        priority_rx: Receiver<AudioCmd>,
        normal_rx: Receiver<AudioCmd>,
        feedback_tx: Sender<AudioFeedback>,
    ) -> Self {
        Self {
            engine,
            priority_rx,
            normal_rx,
            feedback_tx,
            poll_interval: config.poll_interval.max(Duration::from_micros(100)),
            telemetry: LoopTelemetry::new(),
            telemetry_interval: config.telemetry_interval,
            last_telemetry_emit: Instant::now(),
            last_snapshot: None,
            last_running: false,
            last_scale_running: false,
            dirty: true,
        }
    }

    pub(crate) fn run(mut self) {
        loop {
            let remaining = match self.engine.next_deadline() {
                Some(at) => at.saturating_duration_since(Instant::now()).min(self.poll_interval),
                None => IDLE_WAIT,
            };

            crossbeam_channel::select! {
                recv(self.priority_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd) {
                                break;
                            }
                        }
                        Err(_) => break, // Disconnected
                    }
                }
                recv(self.normal_rx) -> result => {
                    match result {
                        Ok(cmd) => {
                            if self.handle_cmd(cmd) {
                                break;
                            }
                        }
                        Err(_) => break, // Disconnected
                    }
                }
                default(remaining) => {}
            }

            if self.drain_priority_commands() {
                break;
            }
            if self.drain_normal_commands() {
                break;
            }

            self.poll_engine();
            self.publish();
            self.maybe_emit_telemetry();
        }

        self.engine.shutdown();
        self.dirty = true;
        self.publish();
    }

    fn drain_priority_commands(&mut self) -> bool {
        const MAX_DRAIN_PER_TICK: usize = 64;
        for _ in 0..MAX_DRAIN_PER_TICK {
            match self.priority_rx.try_recv() {
                Ok(cmd) => {
                    if self.handle_cmd(cmd) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
        false
    }

    fn drain_normal_commands(&mut self) -> bool {
        const MAX_DRAIN_PER_TICK: usize = 32;
        for _ in 0..MAX_DRAIN_PER_TICK {
            match self.normal_rx.try_recv() {
                Ok(cmd) => {
                    if self.handle_cmd(cmd) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
        false
    }

    /// Returns true when the loop should exit.
    fn handle_cmd(&mut self, cmd: AudioCmd) -> bool {
        let now = Instant::now();
        match cmd {
            AudioCmd::UpdateSnapshot(view) => self.engine.update_snapshot(view),
            AudioCmd::UpdateSettings(settings) => self.engine.set_settings(settings),
            AudioCmd::SetPattern { target, pattern } => {
                self.engine.set_pattern_for_target(target, pattern)
            }
            AudioCmd::Start => {
                self.engine.start(now);
            }
            AudioCmd::Stop => self.engine.stop(),
            AudioCmd::Toggle => {
                self.engine.toggle(now);
            }
            AudioCmd::SetTempo(bpm) => {
                let bpm = self.engine.set_tempo(bpm);
                let _ = self.feedback_tx.send(AudioFeedback::BpmUpdate(bpm));
            }
            AudioCmd::PlayScale(notes) => {
                self.engine.play_scale(&notes, now);
            }
            AudioCmd::StopScale => {
                self.engine.stop_scale(now);
            }
            AudioCmd::ToggleScale(notes) => {
                self.engine.toggle_scale(&notes, now);
            }
            AudioCmd::NoteOn(pitch) => self.engine.note_on(pitch),
            AudioCmd::NoteOff(pitch) => self.engine.note_off(pitch),
            AudioCmd::ReleaseAll => self.engine.release_all(),
            AudioCmd::Shutdown => return true,
        }
        self.dirty = true;
        false
    }

    fn poll_engine(&mut self) {
        let now = Instant::now();
        if let Some(due) = self.engine.next_deadline() {
            if due <= now {
                self.telemetry.record_lateness(now - due);
            }
        }
        if self.engine.poll(now) > 0 {
            self.telemetry.record(now.elapsed(), self.poll_interval);
            self.dirty = true;
        }
    }

    /// Send feedback for whatever changed since the last call.
    fn publish(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let running = self.engine.is_running();
        if running != self.last_running {
            self.last_running = running;
            let _ = self.feedback_tx.send(AudioFeedback::PlayingChanged(running));
        }
        let scale_running = self.engine.is_scale_running();
        if scale_running != self.last_scale_running {
            self.last_scale_running = scale_running;
            let _ = self.feedback_tx.send(AudioFeedback::ScaleRunChanged(scale_running));
        }
        let snapshot = self.engine.snapshot();
        if self.last_snapshot.as_ref() != Some(&snapshot) {
            self.last_snapshot = Some(snapshot.clone());
            let _ = self.feedback_tx.send(AudioFeedback::Transport(snapshot));
        }
    }

    fn maybe_emit_telemetry(&mut self) {
        if self.last_telemetry_emit.elapsed() < self.telemetry_interval {
            return;
        }
        self.last_telemetry_emit = Instant::now();
        let summary = self.telemetry.take_summary();
        if summary.samples > 0 {
            log::debug!(
                target: "audio",
                "loop: {} samples, avg {}us, p95 {}us, max {}us, late {}us, overruns {}",
                summary.samples,
                summary.avg_busy_us,
                summary.p95_busy_us,
                summary.max_busy_us,
                summary.max_late_us,
                summary.overruns
            );
        }
        let _ = self.feedback_tx.send(AudioFeedback::Telemetry(summary));
    }
}
