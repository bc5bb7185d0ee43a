use crate::{NoteSet, Result};

/// Maps a chord or scale name plus a root key to concrete pitches.
///
/// A miss is `ChordloopError::NotFound`; callers absorb it as an empty set.
pub trait NoteResolver: Send + Sync {
    fn lookup(&self, name: &str, key: &str) -> Result<NoteSet>;
}
