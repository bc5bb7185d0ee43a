//! AudioHandle: main-thread interface to the pattern engine.
//!
//! Owns the command/feedback channels. The engine and its timers live on
//! the audio thread.

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender as CrossbeamSender;

use chordloop_types::{
    NoteSet, Pattern, PatternTarget, Pitch, PlaybackSettings, SelectionState, SequenceStore,
    TransportSnapshot,
};
use chordloop_types::transport::DEFAULT_BPM;

use super::commands::{AudioCmd, AudioFeedback};
use super::engine::backend::AudioBackend;
use super::engine::{EngineConfig, PatternEngine};
use super::snapshot::SelectionSnapshot;
use super::telemetry::TelemetrySummary;

/// Audio-owned read state: values the audio thread is the authority on.
/// Feedback updates them; the UI reads them for display.
#[derive(Debug, Clone)]
pub struct AudioReadState {
    pub playing: bool,
    pub bpm: f32,
    pub scale_running: bool,
    pub transport: TransportSnapshot,
    pub telemetry: Option<TelemetrySummary>,
}

impl Default for AudioReadState {
    fn default() -> Self {
        Self {
            playing: false,
            bpm: DEFAULT_BPM,
            scale_running: false,
            transport: TransportSnapshot { bpm: DEFAULT_BPM, ..Default::default() },
            telemetry: None,
        }
    }
}

/// Main-thread handle to the audio subsystem.
///
/// Uses separate priority and normal channels so manual notes are not
/// queued behind state sync.
pub struct AudioHandle {
    /// Priority commands: manual notes, panic
    priority_tx: CrossbeamSender<AudioCmd>,
    /// Normal commands: state sync, transport
    normal_tx: CrossbeamSender<AudioCmd>,
    feedback_rx: Receiver<AudioFeedback>,
    audio_state: AudioReadState,
    backend_name: &'static str,
    join_handle: Option<JoinHandle<()>>,
}

impl AudioHandle {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: EngineConfig,
        settings: PlaybackSettings,
        global: Pattern,
    ) -> Self {
        let (priority_tx, priority_rx) = crossbeam_channel::unbounded();
        let (normal_tx, normal_rx) = crossbeam_channel::unbounded();
        let (feedback_tx, feedback_rx) = mpsc::channel();
        let backend_name = backend.name();

        let join_handle = thread::Builder::new()
            .name("chordloop-audio".into())
            .spawn(move || {
                let engine = PatternEngine::new(backend, &config, settings, global);
                let thread = super::audio_thread::AudioThread::new(
                    engine,
                    &config,
                    priority_rx,
                    normal_rx,
                    feedback_tx,
                );
                thread.run();
            });
        let join_handle = match join_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!(target: "audio", "failed to spawn audio thread: {}", e);
                None
            }
        };
        log::info!(target: "audio", "audio thread started on {} backend", backend_name);

        Self {
            priority_tx,
            normal_tx,
            feedback_rx,
            audio_state: AudioReadState::default(),
            backend_name,
            join_handle,
        }
    }

    /// Send a command to the audio thread, routing to priority or normal channel.
    pub fn send_cmd(&self, cmd: AudioCmd) -> Result<(), String> {
        if cmd.is_priority() {
            self.priority_tx
                .send(cmd)
                .map_err(|_| "Audio thread disconnected".to_string())
        } else {
            self.normal_tx
                .send(cmd)
                .map_err(|_| "Audio thread disconnected".to_string())
        }
    }

    /// Fire-and-forget: send a command and log if the audio thread is disconnected.
    fn send(&self, cmd: AudioCmd) {
        if let Err(e) = self.send_cmd(cmd) {
            log::warn!(target: "audio", "command dropped: {}", e);
        }
    }

    pub fn drain_feedback(&mut self) -> Vec<AudioFeedback> {
        let mut out = Vec::new();
        while let Ok(msg) = self.feedback_rx.try_recv() {
            self.apply_feedback(&msg);
            out.push(msg);
        }
        out
    }

    fn apply_feedback(&mut self, feedback: &AudioFeedback) {
        match feedback {
            AudioFeedback::Transport(snapshot) => {
                self.audio_state.playing = snapshot.running;
                self.audio_state.bpm = snapshot.bpm;
                self.audio_state.transport = snapshot.clone();
            }
            AudioFeedback::PlayingChanged(playing) => {
                self.audio_state.playing = *playing;
            }
            AudioFeedback::BpmUpdate(bpm) => {
                self.audio_state.bpm = *bpm;
            }
            AudioFeedback::ScaleRunChanged(running) => {
                self.audio_state.scale_running = *running;
            }
            AudioFeedback::Telemetry(summary) => {
                self.audio_state.telemetry = Some(*summary);
            }
        }
    }

    pub fn read_state(&self) -> &AudioReadState {
        &self.audio_state
    }

    pub fn is_playing(&self) -> bool {
        self.audio_state.playing
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    // ── State sync ──

    pub fn update_snapshot(&self, selection: &SelectionState, sequence: &SequenceStore) {
        self.send(AudioCmd::UpdateSnapshot(SelectionSnapshot::new(
            selection.clone(),
            sequence.clone(),
        )));
    }

    pub fn update_settings(&self, settings: &PlaybackSettings) {
        self.send(AudioCmd::UpdateSettings(settings.clone()));
    }

    pub fn set_pattern(&self, target: PatternTarget, pattern: Option<Pattern>) {
        self.send(AudioCmd::SetPattern { target, pattern });
    }

    // ── Transport ──

    pub fn start(&self) {
        self.send(AudioCmd::Start);
    }

    pub fn stop(&self) {
        self.send(AudioCmd::Stop);
    }

    pub fn toggle(&self) {
        self.send(AudioCmd::Toggle);
    }

    pub fn set_tempo(&self, bpm: f32) {
        self.send(AudioCmd::SetTempo(bpm));
    }

    pub fn play_scale(&self, notes: &NoteSet) {
        self.send(AudioCmd::PlayScale(notes.clone()));
    }

    pub fn stop_scale(&self) {
        self.send(AudioCmd::StopScale);
    }

    pub fn toggle_scale(&self, notes: &NoteSet) {
        self.send(AudioCmd::ToggleScale(notes.clone()));
    }

    // ── Manual notes ──

    pub fn note_on(&self, pitch: Pitch) {
        self.send(AudioCmd::NoteOn(pitch));
    }

    pub fn note_off(&self, pitch: Pitch) {
        self.send(AudioCmd::NoteOff(pitch));
    }

    pub fn release_all(&self) {
        self.send(AudioCmd::ReleaseAll);
    }

    /// Stop the audio thread and wait for it. The engine silences the
    /// backend on the way out. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let _ = self.send_cmd(AudioCmd::Shutdown);
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
        self.drain_feedback();
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
