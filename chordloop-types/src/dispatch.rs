//! Dispatch abstraction.

use crate::{Action, Result};

/// What a successful dispatch reports back to the front end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Index of an entry the action appended.
    pub added_index: Option<usize>,
    /// Human-readable note for a status line.
    pub status: Option<String>,
}

impl DispatchOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn added(index: usize) -> Self {
        Self { added_index: Some(index), ..Self::default() }
    }

    pub fn with_status(message: impl Into<String>) -> Self {
        Self { status: Some(message.into()), ..Self::default() }
    }
}

/// Trait for dispatching actions to the state engine.
///
/// The binary uses this trait to abstract over the dispatch mechanism.
pub trait Dispatcher {
    fn dispatch(&mut self, action: &Action) -> Result<DispatchOutcome>;
}
