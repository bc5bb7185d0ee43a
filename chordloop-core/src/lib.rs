//! # chordloop-core
//!
//! State management, intent dispatch and configuration for chordloop,
//! independent of any front end.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chordloop_core::config::Config;
//! use chordloop_core::dispatch::LocalDispatcher;
//! use chordloop_core::resolver::IntervalResolver;
//! use chordloop_core::state::AppState;
//! use chordloop_audio::{AudioHandle, LogBackend};
//! use chordloop_types::{Action, Dispatcher, SequenceAction, TransportAction};
//!
//! let config = Config::load();
//! let defaults = config.defaults();
//! let mut audio = AudioHandle::new(
//!     Box::new(LogBackend),
//!     config.engine_config(),
//!     defaults.settings.clone(),
//!     defaults.pattern.clone(),
//! );
//! let mut state = AppState::new_with_defaults(defaults);
//! let resolver = IntervalResolver::new();
//!
//! let mut dispatcher = LocalDispatcher::new(&mut state, &mut audio, &resolver);
//! dispatcher.dispatch(&Action::Sequence(SequenceAction::AddChord("Am7".into())))?;
//! dispatcher.dispatch(&Action::Transport(TransportAction::Start))?;
//! ```
//!
//! ## Module Overview
//!
//! - [`state`]: `AppState`, the main-thread copy of sequence, selection and settings
//! - [`dispatch`]: `dispatch_action()`, the single entry point for state mutation;
//!   audio writes come out as `AudioSideEffect`s
//! - [`config`]: layered TOML configuration (embedded defaults + user override)
//! - [`resolver`]: `IntervalResolver`, the built-in chord/scale lookup

pub mod config;
pub mod dispatch;
pub mod resolver;
pub mod state;
