use serde::{Deserialize, Serialize};

use crate::music::transpose_chord_name;
use crate::{ChordloopError, EntryId, NoteSet, Result};

/// A chord (or scale) the user saved into the progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub name: String,
    pub note_set: NoteSet,
    /// Key the notes were resolved against.
    pub source_key: String,
    pub source_mode: String,
}

impl SequenceEntry {
    pub fn new(
        name: impl Into<String>,
        note_set: NoteSet,
        source_key: impl Into<String>,
        source_mode: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            note_set,
            source_key: source_key.into(),
            source_mode: source_mode.into(),
        }
    }

    /// The same entry moved by `steps` semitones into `key`: root and slash
    /// bass renamed, every note shifted with the voicing order kept.
    pub fn transposed(&self, steps: i32, key: &str) -> SequenceEntry {
        SequenceEntry {
            name: transpose_chord_name(&self.name, steps),
            note_set: self.note_set.transposed(steps),
            source_key: key.to_string(),
            source_mode: self.source_mode.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Slot {
    id: EntryId,
    entry: SequenceEntry,
}

/// Ordered list of saved entries and the selected index.
///
/// Every edit is a single `&mut self` call, so the list and the selection
/// pointer never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStore {
    slots: Vec<Slot>,
    selected: Option<usize>,
    next_id: u32,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(ChordloopError::OutOfRange { index, len: self.slots.len() })
        }
    }

    /// Append an entry; returns its index.
    pub fn add(&mut self, entry: SequenceEntry) -> usize {
        let id = EntryId::new(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot { id, entry });
        self.slots.len() - 1
    }

    /// Remove an entry. A removed selection becomes absent; a selection
    /// after the removed index moves down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<SequenceEntry> {
        self.check(index)?;
        let slot = self.slots.remove(index);
        self.selected = match self.selected {
            Some(sel) if sel == index => None,
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        Ok(slot.entry)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.selected = None;
    }

    /// Overwrite in place. The entry keeps its id, so its pattern binding
    /// survives.
    pub fn replace_at(&mut self, index: usize, entry: SequenceEntry) -> Result<SequenceEntry> {
        self.check(index)?;
        Ok(std::mem::replace(&mut self.slots[index].entry, entry))
    }

    pub fn select(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            self.check(i)?;
        }
        self.selected = index;
        Ok(())
    }

    /// Reorder; the selection follows the entry it pointed at.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<()> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Ok(());
        }
        let selected_id = self.selected.map(|i| self.slots[i].id);
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);
        self.selected = selected_id.and_then(|id| self.index_of(id));
        Ok(())
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&SequenceEntry> {
        self.selected.and_then(|i| self.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&SequenceEntry> {
        self.slots.get(index).map(|s| &s.entry)
    }

    pub fn id_at(&self, index: usize) -> Option<EntryId> {
        self.slots.get(index).map(|s| s.id)
    }

    pub fn index_of(&self, id: EntryId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    pub fn contains_id(&self, id: EntryId) -> bool {
        self.slots.iter().any(|s| s.id == id)
    }

    pub fn entry_ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &SequenceEntry)> + '_ {
        self.slots.iter().map(|s| (s.id, &s.entry))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
