//! # chordloop-audio
//!
//! The pattern engine and the thread that drives it. `AudioHandle` is the
//! main-thread side; commands go over crossbeam channels and feedback
//! comes back over an mpsc channel.

mod audio_thread;
pub mod commands;
pub mod engine;
pub mod handle;
pub mod snapshot;
pub mod telemetry;

pub use commands::{AudioCmd, AudioFeedback};
pub use engine::backend::{AudioBackend, BackendError, BackendResult, LogBackend, NullBackend};
pub use engine::midi_out::MidiOutBackend;
pub use engine::{EngineConfig, PatternEngine};
pub use handle::{AudioHandle, AudioReadState};
pub use snapshot::SelectionSnapshot;
pub use telemetry::TelemetrySummary;
