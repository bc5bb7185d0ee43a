//! Audio backend trait: the synthesizer capability the engine drives.
//!
//! `AudioBackend` captures what the engine *means* to do (sound a pitch,
//! silence it, panic) independently of how it's done (MIDI messages, a
//! soft synth, a log line). This enables unit testing of playback logic
//! without any audio device.

use std::fmt;
use std::sync::{Arc, Mutex};

use chordloop_types::Pitch;

/// Result type for backend operations.
pub type BackendResult<T = ()> = Result<T, BackendError>;

/// Error from a backend operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError(e.to_string())
    }
}

impl From<String> for BackendError {
    fn from(s: String) -> Self {
        BackendError(s)
    }
}

/// Voice-level audio backend.
///
/// Calls are fire-and-forget and must not block. Releasing a pitch that
/// isn't sounding, or calling `release_all` with nothing sounding, is fine.
pub trait AudioBackend: Send {
    /// Start a voice. `velocity` is in `[0, 1]`.
    fn trigger(&self, pitch: Pitch, velocity: f32) -> BackendResult;

    /// End the voice on `pitch`.
    fn release(&self, pitch: Pitch) -> BackendResult;

    /// Panic control: silence everything now.
    fn release_all(&self) -> BackendResult;

    /// Short name for logs.
    fn name(&self) -> &'static str {
        "backend"
    }
}

// ─── Null / Log Backends ────────────────────────────────────────────

/// Discards everything.
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn trigger(&self, _pitch: Pitch, _velocity: f32) -> BackendResult {
        Ok(())
    }
    fn release(&self, _pitch: Pitch) -> BackendResult {
        Ok(())
    }
    fn release_all(&self) -> BackendResult {
        Ok(())
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

/// Logs each operation at info level under the `backend` target.
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn trigger(&self, pitch: Pitch, velocity: f32) -> BackendResult {
        log::info!(target: "backend", "on  {:>4} ({}) vel {:.2}", pitch.to_string(), pitch.get(), velocity);
        Ok(())
    }
    fn release(&self, pitch: Pitch) -> BackendResult {
        log::info!(target: "backend", "off {:>4} ({})", pitch.to_string(), pitch.get());
        Ok(())
    }
    fn release_all(&self) -> BackendResult {
        log::info!(target: "backend", "all notes off");
        Ok(())
    }
    fn name(&self) -> &'static str {
        "log"
    }
}

// ─── Test Backend ───────────────────────────────────────────────────

/// A recorded backend operation for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOp {
    Trigger { pitch: Pitch, velocity: f32 },
    Release(Pitch),
    ReleaseAll,
}

/// A test backend that records all operations into a vector for assertions.
/// All operations succeed unless a failure was injected with `fail_on`.
/// Uses `Mutex` for interior mutability so the backend is `Send + Sync`
/// (needed for `Arc<TestBackend>` sharing).
pub struct TestBackend {
    ops: Mutex<Vec<TestOp>>,
    failing: Mutex<Vec<Pitch>>,
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBackend {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    /// Make `trigger(pitch)` fail from now on. Failed triggers are not recorded.
    pub fn fail_on(&self, pitch: Pitch) {
        self.failing.lock().unwrap().push(pitch);
    }

    /// Return all recorded operations.
    pub fn operations(&self) -> Vec<TestOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Clear recorded operations.
    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Count operations matching a predicate.
    pub fn count<F: Fn(&TestOp) -> bool>(&self, f: F) -> usize {
        self.ops.lock().unwrap().iter().filter(|op| f(op)).count()
    }

    /// Find the first operation matching a predicate.
    pub fn find<F: Fn(&TestOp) -> bool>(&self, f: F) -> Option<TestOp> {
        self.ops.lock().unwrap().iter().find(|op| f(op)).cloned()
    }

    /// Pitches triggered, in order.
    pub fn triggers(&self) -> Vec<Pitch> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                TestOp::Trigger { pitch, .. } => Some(*pitch),
                _ => None,
            })
            .collect()
    }

    /// Pitches released individually, in order.
    pub fn releases(&self) -> Vec<Pitch> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                TestOp::Release(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn release_all_count(&self) -> usize {
        self.count(|op| matches!(op, TestOp::ReleaseAll))
    }

    /// Pitches still sounding if the recorded ops were replayed on a synth.
    pub fn outstanding(&self) -> Vec<Pitch> {
        let mut sounding: Vec<Pitch> = Vec::new();
        for op in self.ops.lock().unwrap().iter() {
            match op {
                TestOp::Trigger { pitch, .. } => sounding.push(*pitch),
                TestOp::Release(p) => {
                    if let Some(i) = sounding.iter().position(|s| s == p) {
                        sounding.remove(i);
                    }
                }
                TestOp::ReleaseAll => sounding.clear(),
            }
        }
        sounding
    }
}

impl AudioBackend for TestBackend {
    fn trigger(&self, pitch: Pitch, velocity: f32) -> BackendResult {
        if self.failing.lock().unwrap().contains(&pitch) {
            return Err(BackendError(format!("injected failure on {}", pitch)));
        }
        self.ops.lock().unwrap().push(TestOp::Trigger { pitch, velocity });
        Ok(())
    }

    fn release(&self, pitch: Pitch) -> BackendResult {
        self.ops.lock().unwrap().push(TestOp::Release(pitch));
        Ok(())
    }

    fn release_all(&self) -> BackendResult {
        self.ops.lock().unwrap().push(TestOp::ReleaseAll);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "test"
    }
}

/// Wraps `Arc<TestBackend>` to implement `AudioBackend` so the engine can
/// own a `Box<dyn AudioBackend>` while tests retain an `Arc` for assertions.
pub struct SharedTestBackend(pub Arc<TestBackend>);

impl AudioBackend for SharedTestBackend {
    fn trigger(&self, pitch: Pitch, velocity: f32) -> BackendResult {
        self.0.trigger(pitch, velocity)
    }
    fn release(&self, pitch: Pitch) -> BackendResult {
        self.0.release(pitch)
    }
    fn release_all(&self) -> BackendResult {
        self.0.release_all()
    }
    fn name(&self) -> &'static str {
        "test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u8) -> Pitch {
        Pitch::new(n)
    }

    #[test]
    fn test_backend_records_ops() {
        let b = TestBackend::new();
        b.trigger(p(60), 0.5).unwrap();
        b.release(p(60)).unwrap();
        b.release_all().unwrap();
        assert_eq!(
            b.operations(),
            vec![
                TestOp::Trigger { pitch: p(60), velocity: 0.5 },
                TestOp::Release(p(60)),
                TestOp::ReleaseAll,
            ]
        );
        b.clear();
        assert!(b.operations().is_empty());
    }

    #[test]
    fn test_outstanding_replays() {
        let b = TestBackend::new();
        b.trigger(p(60), 1.0).unwrap();
        b.trigger(p(64), 1.0).unwrap();
        b.release(p(60)).unwrap();
        assert_eq!(b.outstanding(), vec![p(64)]);
        b.release_all().unwrap();
        assert!(b.outstanding().is_empty());
        // releasing a silent pitch is harmless
        b.release(p(70)).unwrap();
        assert!(b.outstanding().is_empty());
    }

    #[test]
    fn test_fail_on_injects_error() {
        let b = TestBackend::new();
        b.fail_on(p(62));
        assert!(b.trigger(p(62), 1.0).is_err());
        assert!(b.trigger(p(60), 1.0).is_ok());
        assert_eq!(b.triggers(), vec![p(60)]);
    }

    #[test]
    fn test_shared_backend_forwards() {
        let inner = Arc::new(TestBackend::new());
        let boxed: Box<dyn AudioBackend> = Box::new(SharedTestBackend(Arc::clone(&inner)));
        boxed.trigger(p(67), 0.8).unwrap();
        boxed.release_all().unwrap();
        assert_eq!(inner.triggers(), vec![p(67)]);
        assert_eq!(inner.release_all_count(), 1);
    }

    #[test]
    fn test_null_and_log_backends_accept_everything() {
        for b in [Box::new(NullBackend) as Box<dyn AudioBackend>, Box::new(LogBackend)] {
            assert!(b.trigger(p(60), 1.0).is_ok());
            assert!(b.release(p(60)).is_ok());
            assert!(b.release_all().is_ok());
        }
    }
}
