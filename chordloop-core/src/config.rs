use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use chordloop_audio::EngineConfig;
use chordloop_types::music::{Key, Mode};
use chordloop_types::transport::{clamp_bpm, DEFAULT_BPM};
use chordloop_types::{Pattern, Pitch, PitchRange, PlaybackSettings, Subdivision};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    engine: EngineSection,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<f32>,
    key: Option<String>,
    mode: Option<String>,
    pattern: Option<String>,
    sustain: Option<bool>,
    octave_offset: Option<i32>,
    note_duration: Option<f32>,
    volume: Option<f32>,
    instrument: Option<String>,
}

#[derive(Deserialize, Default)]
struct EngineSection {
    subdivision: Option<String>,
    swing: Option<f32>,
    instrument_first: Option<u8>,
    instrument_last: Option<u8>,
    poll_interval_us: Option<u64>,
    telemetry_interval_secs: Option<u64>,
}

/// Values a fresh session starts with.
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub bpm: f32,
    pub key: Key,
    pub mode: Mode,
    pub pattern: Pattern,
    pub settings: PlaybackSettings,
}

pub struct Config {
    defaults: DefaultsConfig,
    engine: EngineSection,
}

impl Config {
    /// Embedded defaults, overridden by the user's config file if any.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    /// Embedded defaults, overridden by `path` if it exists.
    pub fn load_from(path: Option<&Path>) -> Self {
        let mut base: ConfigFile = match toml::from_str(DEFAULT_CONFIG) {
            Ok(base) => base,
            Err(e) => {
                log::warn!(target: "config", "embedded config.toml is malformed: {}", e);
                ConfigFile::default()
            }
        };

        if let Some(path) = path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_engine(&mut base.engine, user.engine);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            engine: base.engine,
        }
    }

    pub fn bpm(&self) -> f32 {
        self.defaults.bpm.map(clamp_bpm).unwrap_or(DEFAULT_BPM)
    }

    pub fn key(&self) -> Key {
        self.defaults.key.as_deref().and_then(Key::parse).unwrap_or(Key::C)
    }

    pub fn mode(&self) -> Mode {
        self.defaults.mode.as_deref().and_then(Mode::from_name).unwrap_or(Mode::Major)
    }

    /// The global pattern. A malformed pattern is logged and replaced by
    /// the built-in default.
    pub fn pattern(&self) -> Pattern {
        let Some(text) = self.defaults.pattern.as_deref() else {
            return Pattern::default_global();
        };
        match Pattern::parse(text) {
            Ok(pattern) => pattern,
            Err(e) => {
                log::warn!(target: "config", "bad default pattern {:?}: {}", text, e);
                Pattern::default_global()
            }
        }
    }

    pub fn instrument_range(&self) -> PitchRange {
        let fallback = PitchRange::PIANO;
        let first = self.engine.instrument_first.map(Pitch::new).unwrap_or(fallback.first);
        let last = self.engine.instrument_last.map(Pitch::new).unwrap_or(fallback.last);
        PitchRange::new(first, last)
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        let mut settings = PlaybackSettings::default();
        if let Some(sustain) = self.defaults.sustain {
            settings.set_sustain(sustain);
        }
        if let Some(offset) = self.defaults.octave_offset {
            settings.set_octave_offset(offset);
        }
        if let Some(duration) = self.defaults.note_duration {
            settings.set_note_duration(duration);
        }
        if let Some(volume) = self.defaults.volume {
            settings.set_output_level(volume);
        }
        if let Some(name) = self.defaults.instrument.as_deref() {
            settings.set_instrument_name(name);
        }
        settings.set_range(self.instrument_range());
        settings
    }

    pub fn defaults(&self) -> SessionDefaults {
        SessionDefaults {
            bpm: self.bpm(),
            key: self.key(),
            mode: self.mode(),
            pattern: self.pattern(),
            settings: self.playback_settings(),
        }
    }

    pub fn subdivision(&self) -> Subdivision {
        self.engine
            .subdivision
            .as_deref()
            .and_then(Subdivision::from_name)
            .unwrap_or_default()
    }

    /// Swing amount, clamped to `[0, 0.5]`.
    pub fn swing(&self) -> f32 {
        self.engine
            .swing
            .filter(|s| s.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, chordloop_audio::engine::MAX_SWING)
    }

    /// Audio loop poll interval (clamped to 100us..10ms).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.engine.poll_interval_us.unwrap_or(1000).clamp(100, 10_000))
    }

    /// Telemetry summary interval in seconds (clamped to 1..3600).
    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_secs(self.engine.telemetry_interval_secs.unwrap_or(10).clamp(1, 3600))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            subdivision: self.subdivision(),
            swing: self.swing(),
            poll_interval: self.poll_interval(),
            telemetry_interval: self.telemetry_interval(),
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chordloop").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.key.is_some() {
        base.key = user.key;
    }
    if user.mode.is_some() {
        base.mode = user.mode;
    }
    if user.pattern.is_some() {
        base.pattern = user.pattern;
    }
    if user.sustain.is_some() {
        base.sustain = user.sustain;
    }
    if user.octave_offset.is_some() {
        base.octave_offset = user.octave_offset;
    }
    if user.note_duration.is_some() {
        base.note_duration = user.note_duration;
    }
    if user.volume.is_some() {
        base.volume = user.volume;
    }
    if user.instrument.is_some() {
        base.instrument = user.instrument;
    }
}

fn merge_engine(base: &mut EngineSection, user: EngineSection) {
    if user.subdivision.is_some() {
        base.subdivision = user.subdivision;
    }
    if user.swing.is_some() {
        base.swing = user.swing;
    }
    if user.instrument_first.is_some() {
        base.instrument_first = user.instrument_first;
    }
    if user.instrument_last.is_some() {
        base.instrument_last = user.instrument_last;
    }
    if user.poll_interval_us.is_some() {
        base.poll_interval_us = user.poll_interval_us;
    }
    if user.telemetry_interval_secs.is_some() {
        base.telemetry_interval_secs = user.telemetry_interval_secs;
    }
}
