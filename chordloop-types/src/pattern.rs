use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{ChordloopError, EntryId, Result};

/// One note slot inside a step: a 0-based index into the active note set
/// plus an octave shift (`+` / `'` suffixes in the notation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepNote {
    pub index: usize,
    pub octave_shift: i8,
}

impl StepNote {
    pub fn new(index: usize) -> Self {
        Self { index, octave_shift: 0 }
    }

    pub fn shifted(index: usize, octave_shift: i8) -> Self {
        Self { index, octave_shift }
    }
}

/// What a single step plays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepSpec {
    Rest,
    /// Block chord: every note of the set.
    All,
    Notes(Vec<StepNote>),
}

impl StepSpec {
    /// Concrete note slots for a set of `set_len` notes. Indices beyond the
    /// set are skipped so the remaining slots still sound.
    pub fn expand(&self, set_len: usize) -> Vec<StepNote> {
        match self {
            StepSpec::Rest => Vec::new(),
            StepSpec::All => (0..set_len).map(StepNote::new).collect(),
            StepSpec::Notes(notes) => notes.iter().copied().filter(|n| n.index < set_len).collect(),
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, StepSpec::Rest)
    }

    fn parse_token(token: &str) -> Result<Self> {
        match token {
            "x" | "X" | "-" => return Ok(StepSpec::Rest),
            "*" => return Ok(StepSpec::All),
            _ => {}
        }
        let mut notes = Vec::new();
        for part in token.split('&') {
            notes.push(parse_step_note(part, token)?);
        }
        Ok(StepSpec::Notes(notes))
    }
}

fn parse_step_note(part: &str, token: &str) -> Result<StepNote> {
    let digits_end = part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len());
    let (digits, suffix) = part.split_at(digits_end);
    if digits.is_empty() {
        return Err(ChordloopError::InvalidConfiguration(format!(
            "unknown pattern token '{}'",
            token
        )));
    }
    let number: usize = digits.parse().map_err(|_| {
        ChordloopError::InvalidConfiguration(format!("unknown pattern token '{}'", token))
    })?;
    if number == 0 {
        return Err(ChordloopError::InvalidConfiguration(
            "pattern note numbers start at 1".to_string(),
        ));
    }
    let mut shift: i32 = 0;
    for c in suffix.chars() {
        match c {
            '+' => shift += 1,
            '\'' => shift -= 1,
            _ => {
                return Err(ChordloopError::InvalidConfiguration(format!(
                    "unknown pattern token '{}'",
                    token
                )))
            }
        }
    }
    let shift = shift.clamp(i8::MIN as i32, i8::MAX as i32) as i8;
    Ok(StepNote::shifted(number - 1, shift))
}

impl std::fmt::Display for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepSpec::Rest => f.write_str("x"),
            StepSpec::All => f.write_str("*"),
            StepSpec::Notes(notes) => {
                for (i, note) in notes.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{}", note.index + 1)?;
                    let mark = if note.octave_shift >= 0 { "+" } else { "'" };
                    for _ in 0..note.octave_shift.unsigned_abs() {
                        f.write_str(mark)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// An immutable, non-empty list of steps. Cloning shares the step list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    steps: Arc<[StepSpec]>,
}

impl Pattern {
    pub fn new(steps: Vec<StepSpec>) -> Result<Self> {
        if steps.is_empty() {
            return Err(ChordloopError::InvalidConfiguration("pattern is empty".to_string()));
        }
        Ok(Self { steps: steps.into() })
    }

    /// Parse the text notation: whitespace- or comma-separated tokens.
    pub fn parse(text: &str) -> Result<Self> {
        let steps = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(StepSpec::parse_token)
            .collect::<Result<Vec<_>>>()?;
        Self::new(steps)
    }

    /// Built-in global pattern: `1 2 3 4`.
    pub fn default_global() -> Self {
        Self {
            steps: (0..4).map(|i| StepSpec::Notes(vec![StepNote::new(i)])).collect(),
        }
    }

    /// Every step sounds the whole set.
    pub fn block() -> Self {
        Self { steps: Arc::from(vec![StepSpec::All]) }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step for a monotonic step counter (wraps).
    pub fn step(&self, counter: u64) -> &StepSpec {
        &self.steps[(counter % self.steps.len() as u64) as usize]
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::default_global()
    }
}

impl FromStr for Pattern {
    type Err = ChordloopError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pattern {
    type Error = ChordloopError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Pattern> for String {
    fn from(p: Pattern) -> Self {
        p.to_string()
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// What a pattern is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternTarget {
    Global,
    Entry(EntryId),
}

/// The global pattern plus per-entry overrides. At most one binding per
/// target; a missing override falls back to the global one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternBindings {
    global: Pattern,
    overrides: HashMap<EntryId, Pattern>,
}

impl PatternBindings {
    pub fn new(global: Pattern) -> Self {
        Self { global, overrides: HashMap::new() }
    }

    pub fn global(&self) -> &Pattern {
        &self.global
    }

    /// `None` clears an override; for the global target it restores the
    /// built-in default pattern.
    pub fn set(&mut self, target: PatternTarget, pattern: Option<Pattern>) {
        match (target, pattern) {
            (PatternTarget::Global, Some(p)) => self.global = p,
            (PatternTarget::Global, None) => self.global = Pattern::default_global(),
            (PatternTarget::Entry(id), Some(p)) => {
                self.overrides.insert(id, p);
            }
            (PatternTarget::Entry(id), None) => {
                self.overrides.remove(&id);
            }
        }
    }

    pub fn override_for(&self, id: EntryId) -> Option<&Pattern> {
        self.overrides.get(&id)
    }

    /// Pattern that plays for an entry: its override or the global one.
    pub fn for_entry(&self, id: EntryId) -> &Pattern {
        self.overrides.get(&id).unwrap_or(&self.global)
    }

    /// Drop overrides whose entry no longer exists. Returns how many went.
    pub fn retain_entries(&mut self, mut alive: impl FnMut(EntryId) -> bool) -> usize {
        let before = self.overrides.len();
        self.overrides.retain(|id, _| alive(*id));
        before - self.overrides.len()
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_notation() {
        let p = Pattern::parse("1 x 2+ 3'").unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.steps()[0], StepSpec::Notes(vec![StepNote::new(0)]));
        assert_eq!(p.steps()[1], StepSpec::Rest);
        assert_eq!(p.steps()[2], StepSpec::Notes(vec![StepNote::shifted(1, 1)]));
        assert_eq!(p.steps()[3], StepSpec::Notes(vec![StepNote::shifted(2, -1)]));
    }

    #[test]
    fn test_parse_commas_chords_and_block() {
        let p = Pattern::parse("1&3&5,*, X,-").unwrap();
        assert_eq!(
            p.steps()[0],
            StepSpec::Notes(vec![StepNote::new(0), StepNote::new(2), StepNote::new(4)])
        );
        assert_eq!(p.steps()[1], StepSpec::All);
        assert!(p.steps()[2].is_rest());
        assert!(p.steps()[3].is_rest());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Pattern::parse(""), Err(ChordloopError::InvalidConfiguration(_))));
        assert!(matches!(Pattern::parse("   ,"), Err(ChordloopError::InvalidConfiguration(_))));
        assert!(matches!(Pattern::parse("0"), Err(ChordloopError::InvalidConfiguration(_))));
        assert!(matches!(Pattern::parse("1 q"), Err(ChordloopError::InvalidConfiguration(_))));
        assert!(matches!(Pattern::parse("2+x"), Err(ChordloopError::InvalidConfiguration(_))));
        assert!(Pattern::new(Vec::new()).is_err());
    }

    #[test]
    fn test_display_matches_notation() {
        let text = "1 2++ x * 1&3 4'";
        assert_eq!(Pattern::parse(text).unwrap().to_string(), text);
        assert_eq!(Pattern::default_global().to_string(), "1 2 3 4");
    }

    #[test]
    fn test_step_wraps() {
        let p = Pattern::parse("1 2 3").unwrap();
        assert_eq!(p.step(0), p.step(3));
        assert_eq!(p.step(4), &StepSpec::Notes(vec![StepNote::new(1)]));
    }

    #[test]
    fn test_expand_skips_out_of_range_indices() {
        let spec = StepSpec::Notes(vec![StepNote::new(0), StepNote::new(3), StepNote::new(2)]);
        let expanded = spec.expand(3);
        assert_eq!(expanded, vec![StepNote::new(0), StepNote::new(2)]);
        assert_eq!(StepSpec::All.expand(2).len(), 2);
        assert!(StepSpec::All.expand(0).is_empty());
    }

    #[test]
    fn test_bindings_fallback_and_clear() {
        let mut b = PatternBindings::default();
        let id = EntryId::new(7);
        let arp = Pattern::parse("1 3").unwrap();
        assert_eq!(b.for_entry(id), &Pattern::default_global());

        b.set(PatternTarget::Entry(id), Some(arp.clone()));
        assert_eq!(b.for_entry(id), &arp);

        b.set(PatternTarget::Entry(id), None);
        assert_eq!(b.for_entry(id), b.global());

        b.set(PatternTarget::Global, Some(arp.clone()));
        assert_eq!(b.global(), &arp);
        b.set(PatternTarget::Global, None);
        assert_eq!(b.global(), &Pattern::default_global());
    }

    #[test]
    fn test_bindings_retain_prunes_dead_entries() {
        let mut b = PatternBindings::default();
        b.set(PatternTarget::Entry(EntryId::new(1)), Some(Pattern::block()));
        b.set(PatternTarget::Entry(EntryId::new(2)), Some(Pattern::block()));
        let removed = b.retain_entries(|id| id == EntryId::new(2));
        assert_eq!(removed, 1);
        assert!(b.override_for(EntryId::new(1)).is_none());
        assert!(b.override_for(EntryId::new(2)).is_some());
    }

    #[test]
    fn test_pattern_string_conversions() {
        let p: Pattern = String::from("1 x 3").try_into().unwrap();
        let s: String = p.into();
        assert_eq!(s, "1 x 3");
        assert!(Pattern::try_from(String::from("nope")).is_err());
    }
}
