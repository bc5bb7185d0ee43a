use thiserror::Error;

/// Domain errors. Runtime playback conditions never produce these; they
/// come back synchronously from edits and lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChordloopError {
    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ChordloopError>;
