//! MIDI output backend: note-on/note-off on a hardware or virtual port.

use std::sync::Mutex;

use midir::{MidiOutput, MidiOutputConnection};

use chordloop_types::Pitch;

use super::backend::{AudioBackend, BackendError, BackendResult};

const CLIENT_NAME: &str = "chordloop";
const CC_ALL_NOTES_OFF: u8 = 123;

pub fn note_on_message(channel: u8, pitch: Pitch, velocity: f32) -> [u8; 3] {
    [0x90 | (channel & 0x0F), pitch.get(), midi_velocity(velocity)]
}

pub fn note_off_message(channel: u8, pitch: Pitch) -> [u8; 3] {
    [0x80 | (channel & 0x0F), pitch.get(), 0]
}

pub fn all_notes_off_message(channel: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), CC_ALL_NOTES_OFF, 0]
}

/// Scale `[0, 1]` to 1..=127. Velocity 0 would read as a note-off.
pub fn midi_velocity(velocity: f32) -> u8 {
    let v = if velocity.is_finite() { velocity.clamp(0.0, 1.0) } else { 1.0 };
    ((v * 127.0).round() as u8).max(1)
}

/// Names of the MIDI output ports currently visible.
pub fn list_output_ports() -> BackendResult<Vec<String>> {
    let out = MidiOutput::new(CLIENT_NAME).map_err(|e| BackendError(e.to_string()))?;
    Ok(out.ports().iter().filter_map(|p| out.port_name(p).ok()).collect())
}

struct MidiState {
    conn: MidiOutputConnection,
    held: Vec<Pitch>,
}

pub struct MidiOutBackend {
    state: Mutex<MidiState>,
    channel: u8,
    port_name: String,
}

impl MidiOutBackend {
    /// Connect to the first port whose name contains `port_hint`
    /// (case-insensitive), or the first port when no hint is given.
    pub fn connect(port_hint: Option<&str>, channel: u8) -> BackendResult<Self> {
        let out = MidiOutput::new(CLIENT_NAME).map_err(|e| BackendError(e.to_string()))?;
        let ports = out.ports();
        let hint = port_hint.map(|h| h.to_lowercase());
        let port = ports
            .iter()
            .find(|p| match (&hint, out.port_name(p)) {
                (Some(h), Ok(name)) => name.to_lowercase().contains(h.as_str()),
                (None, Ok(_)) => true,
                (_, Err(_)) => false,
            })
            .ok_or_else(|| match port_hint {
                Some(h) => BackendError(format!("no MIDI output port matching '{}'", h)),
                None => BackendError("no MIDI output ports".to_string()),
            })?;
        let port_name = out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
        let conn = out
            .connect(port, "chordloop-out")
            .map_err(|e| BackendError(e.to_string()))?;
        log::info!(target: "audio", "MIDI output connected: {} (channel {})", port_name, channel + 1);
        Ok(Self {
            state: Mutex::new(MidiState { conn, held: Vec::new() }),
            channel: channel & 0x0F,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MidiState) -> BackendResult<T>) -> BackendResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BackendError("MIDI output lock poisoned".to_string()))?;
        f(&mut state)
    }
}

fn send(conn: &mut MidiOutputConnection, msg: &[u8]) -> BackendResult {
    conn.send(msg).map_err(|e| BackendError(e.to_string()))
}

impl AudioBackend for MidiOutBackend {
    fn trigger(&self, pitch: Pitch, velocity: f32) -> BackendResult {
        let channel = self.channel;
        self.with_state(|s| {
            send(&mut s.conn, &note_on_message(channel, pitch, velocity))?;
            if !s.held.contains(&pitch) {
                s.held.push(pitch);
            }
            Ok(())
        })
    }

    fn release(&self, pitch: Pitch) -> BackendResult {
        let channel = self.channel;
        self.with_state(|s| {
            s.held.retain(|p| *p != pitch);
            send(&mut s.conn, &note_off_message(channel, pitch))
        })
    }

    fn release_all(&self) -> BackendResult {
        let channel = self.channel;
        self.with_state(|s| {
            let mut first_err = None;
            for pitch in s.held.drain(..) {
                if let Err(e) = s.conn.send(&note_off_message(channel, pitch)) {
                    first_err.get_or_insert(BackendError(e.to_string()));
                }
            }
            send(&mut s.conn, &all_notes_off_message(channel))?;
            match first_err {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
    }

    fn name(&self) -> &'static str {
        "midi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_messages() {
        assert_eq!(note_on_message(0, Pitch::new(60), 1.0), [0x90, 60, 127]);
        assert_eq!(note_on_message(9, Pitch::new(36), 0.5), [0x99, 36, 64]);
        assert_eq!(note_off_message(1, Pitch::new(64)), [0x81, 64, 0]);
        assert_eq!(all_notes_off_message(15), [0xBF, 123, 0]);
    }

    #[test]
    fn test_channel_masked() {
        assert_eq!(note_on_message(16, Pitch::new(60), 1.0)[0], 0x90);
    }

    #[test]
    fn test_velocity_never_zero() {
        assert_eq!(midi_velocity(0.0), 1);
        assert_eq!(midi_velocity(0.8), 102);
        assert_eq!(midi_velocity(3.0), 127);
        assert_eq!(midi_velocity(f32::NAN), 127);
    }
}
