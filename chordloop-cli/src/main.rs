mod args;
mod player;

use std::fs::File;
use std::io;

use chordloop_audio::engine::midi_out::list_output_ports;
use chordloop_audio::{AudioBackend, AudioHandle, LogBackend, MidiOutBackend};
use chordloop_core::config::Config;
use chordloop_core::dispatch::LocalDispatcher;
use chordloop_core::resolver::IntervalResolver;
use chordloop_core::state::AppState;
use chordloop_types::presets::{self, PatternCategory};
use chordloop_types::{
    Action, ChordloopError, ContextAction, Dispatcher, PatternAction, PatternTarget,
    SelectionAction, SequenceAction, SettingsAction, TransportAction,
};

use args::{CliArgs, USAGE};

fn init_logging(verbose: bool, log_stderr: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    if log_stderr {
        if let Err(e) = TermLogger::init(log_level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto) {
            eprintln!("logger init failed: {}", e);
        }
        return;
    }

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("chordloop")
        .join("chordloop.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(file) => file,
        Err(_) => match File::create(std::env::temp_dir().join("chordloop.log")) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("cannot create log file: {}", e);
                return;
            }
        },
    };

    if let Err(e) = WriteLogger::init(log_level, Config::default(), log_file) {
        eprintln!("logger init failed: {}", e);
        return;
    }

    log::info!("chordloop starting (log level: {:?})", log_level);
}

fn to_io(e: ChordloopError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
}

fn main() -> io::Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{}\n\n{}", e, USAGE)))?;
    init_logging(args.verbose, args.log_stderr);

    if args.help {
        print!("{}", USAGE);
        return Ok(());
    }
    if args.list_ports {
        return list_ports();
    }
    if args.list_presets {
        list_presets();
        return Ok(());
    }
    if args.chords.is_empty() && !args.scale {
        eprint!("{}", USAGE);
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "no chords given"));
    }

    let config = Config::load();
    let backend = open_backend(&args)?;
    let defaults = config.defaults();
    let mut audio = AudioHandle::new(
        backend,
        config.engine_config(),
        defaults.settings.clone(),
        defaults.pattern.clone(),
    );
    log::info!("audio backend: {}", audio.backend_name());

    let mut state = AppState::new_with_defaults(defaults);
    let resolver = IntervalResolver::new();
    let mut dispatcher = LocalDispatcher::new(&mut state, &mut audio, &resolver);

    for action in setup_actions(&args) {
        if let Some(status) = dispatcher.dispatch(&action).map_err(to_io)?.status {
            println!("{}", status);
        }
    }

    let result = if args.scale {
        player::play_scale(&mut dispatcher)
    } else {
        load_chords(&mut dispatcher, &args.chords)
            .and_then(|_| player::play_progression(&mut dispatcher, args.chords.len(), args.loops, config.subdivision()))
    };
    drop(dispatcher);
    audio.shutdown();
    result.map_err(to_io)
}

fn open_backend(args: &CliArgs) -> io::Result<Box<dyn AudioBackend>> {
    match &args.midi_port {
        Some(hint) => {
            let hint = if hint.is_empty() { None } else { Some(hint.as_str()) };
            let backend = MidiOutBackend::connect(hint, args.channel)
                .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;
            println!("MIDI out: {} (channel {})", backend.port_name(), args.channel + 1);
            Ok(Box::new(backend))
        }
        None => Ok(Box::new(LogBackend)),
    }
}

/// Options that map onto intents, in the order they must apply.
fn setup_actions(args: &CliArgs) -> Vec<Action> {
    let mut actions = Vec::new();
    if let Some(key) = &args.key {
        actions.push(Action::Context(ContextAction::SetKey(key.clone())));
    }
    if let Some(mode) = &args.mode {
        actions.push(Action::Context(ContextAction::SetMode(mode.clone())));
    }
    if let Some(bpm) = args.bpm {
        actions.push(Action::Transport(TransportAction::SetTempo(bpm)));
    }
    if let Some(notation) = &args.pattern {
        actions.push(Action::Pattern(PatternAction::SetNotation {
            target: PatternTarget::Global,
            notation: notation.clone(),
        }));
    }
    if let Some(name) = &args.preset {
        actions.push(Action::Pattern(PatternAction::ApplyPreset {
            target: PatternTarget::Global,
            name: name.clone(),
        }));
    }
    if args.sustain {
        actions.push(Action::Settings(SettingsAction::SetSustain(true)));
    }
    if let Some(octave) = args.octave {
        actions.push(Action::Settings(SettingsAction::SetOctaveOffset(octave)));
    }
    actions
}

fn load_chords(dispatcher: &mut LocalDispatcher<'_>, chords: &[String]) -> chordloop_types::Result<()> {
    for name in chords {
        let outcome = dispatcher.dispatch(&Action::Sequence(SequenceAction::AddChord(name.clone())))?;
        if let Some(status) = outcome.status {
            eprintln!("warning: {}", status);
        }
    }
    dispatcher.dispatch(&Action::Selection(SelectionAction::Select(Some(0))))?;
    Ok(())
}

fn list_ports() -> io::Result<()> {
    let ports = list_output_ports().map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    if ports.is_empty() {
        println!("no MIDI output ports");
    }
    for (i, name) in ports.iter().enumerate() {
        println!("{:>2}: {}", i, name);
    }
    Ok(())
}

fn list_presets() {
    for category in PatternCategory::ALL {
        println!("{}:", category.name());
        for preset in presets::by_category(category) {
            println!("  {:<16} {:<20} {}", preset.name, preset.notation, preset.description);
        }
    }
}
