//! Immutable styled lines (component A).
//!
//! Grounded on `original_source`'s copy-on-write `LazyString`+`LineMetadata`
//! pair and the teacher's `StyledLine`/`ColorSpan` shape
//! (`src/color/styled.rs`, trimmed in the final pass once this module
//! replaced it).

use crate::modifiers::ModifierSet;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Opaque handle invoked when a listing buffer's line is "activated" (Enter
/// pressed on it in command mode). The core never interprets the payload; it
/// is installed and consulted only by the buffer that owns the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivateOnEnter {
    None,
    Handler { id: u64, fn_index: u32 },
}

impl Default for ActivateOnEnter {
    fn default() -> Self {
        ActivateOnEnter::None
    }
}

/// An immutable, cheaply-clonable line of text plus per-column styling.
///
/// `content` is `Rc<str>` rather than `Arc<str>`: every `LineContents` lives
/// on the main thread (see the crate's concurrency model); the one
/// cross-thread handoff is a `BufferSnapshot`, which is built and cloned
/// before crossing into the parser thread, not shared live.
#[derive(Debug, Clone)]
pub struct LineContents {
    content: Rc<str>,
    modifiers: Rc<BTreeMap<usize, ModifierSet>>,
    activate_on_enter: ActivateOnEnter,
}

impl PartialEq for LineContents {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content && self.modifiers == other.modifiers
    }
}
impl Eq for LineContents {}

impl LineContents {
    pub fn new(content: impl Into<Rc<str>>) -> Self {
        Self {
            content: content.into(),
            modifiers: Rc::new(BTreeMap::new()),
            activate_on_enter: ActivateOnEnter::None,
        }
    }

    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn with_modifiers(content: impl Into<Rc<str>>, modifiers: BTreeMap<usize, ModifierSet>) -> Self {
        let content = content.into();
        debug_assert!(
            modifiers.keys().all(|&c| c < content.chars().count()),
            "modifier column out of range"
        );
        Self {
            content,
            modifiers: Rc::new(modifiers),
            activate_on_enter: ActivateOnEnter::None,
        }
    }

    pub fn with_activate_on_enter(mut self, handle: ActivateOnEnter) -> Self {
        self.activate_on_enter = handle;
        self
    }

    pub fn activate_on_enter(&self) -> &ActivateOnEnter {
        &self.activate_on_enter
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn length(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the character at column `c`. Out-of-range access is a
    /// programming-invariant violation (fatal), not a recoverable error.
    pub fn get(&self, c: usize) -> char {
        self.content
            .chars()
            .nth(c)
            .unwrap_or_else(|| panic!("LineContents::get: column {c} out of range"))
    }

    pub fn modifiers_at(&self, c: usize) -> ModifierSet {
        self.modifiers.get(&c).cloned().unwrap_or_default()
    }

    pub fn modifiers(&self) -> &BTreeMap<usize, ModifierSet> {
        &self.modifiers
    }

    /// Returns a new line holding `[begin, begin+len)`, with modifiers
    /// shifted and clipped to the sub-range.
    pub fn substring(&self, begin: usize, len: usize) -> Self {
        let total = self.length();
        let begin = begin.min(total);
        let end = (begin + len).min(total);
        let sub: String = self.content.chars().skip(begin).take(end - begin).collect();
        let modifiers = self
            .modifiers
            .iter()
            .filter(|&(&c, _)| c >= begin && c < end)
            .map(|(&c, set)| (c - begin, set.clone()))
            .collect();
        Self {
            content: sub.into(),
            modifiers: Rc::new(modifiers),
            activate_on_enter: ActivateOnEnter::None,
        }
    }

    /// Concatenates `other` after `self`; `other`'s modifier columns shift by
    /// `self.length()`.
    pub fn append(&self, other: &Self) -> Self {
        let left_len = self.length();
        let mut combined = String::with_capacity(self.content.len() + other.content.len());
        combined.push_str(&self.content);
        combined.push_str(&other.content);

        let mut modifiers: BTreeMap<usize, ModifierSet> = (*self.modifiers).clone();
        for (&c, set) in other.modifiers.iter() {
            modifiers.insert(c + left_len, set.clone());
        }

        Self {
            content: combined.into(),
            modifiers: Rc::new(modifiers),
            activate_on_enter: self.activate_on_enter.clone(),
        }
    }
}

impl From<&str> for LineContents {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LineContents {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifiers::Modifier;

    #[test]
    fn substring_shifts_and_clips_modifiers() {
        let mut mods = BTreeMap::new();
        mods.insert(0, ModifierSet::from([Modifier::Bold]));
        mods.insert(3, ModifierSet::from([Modifier::Underline]));
        let line = LineContents::with_modifiers("hello world", mods);

        let sub = line.substring(2, 5); // "llo w"
        assert_eq!(sub.as_str(), "llo w");
        assert_eq!(sub.modifiers_at(1), ModifierSet::from([Modifier::Underline]));
        assert!(sub.modifiers_at(0).is_empty());
    }

    #[test]
    fn append_shifts_right_operand_columns() {
        let mut left_mods = BTreeMap::new();
        left_mods.insert(0, ModifierSet::from([Modifier::Bold]));
        let left = LineContents::with_modifiers("ab", left_mods);

        let mut right_mods = BTreeMap::new();
        right_mods.insert(0, ModifierSet::from([Modifier::Red]));
        let right = LineContents::with_modifiers("cd", right_mods);

        let combined = left.append(&right);
        assert_eq!(combined.as_str(), "abcd");
        assert_eq!(combined.modifiers_at(0), ModifierSet::from([Modifier::Bold]));
        assert_eq!(combined.modifiers_at(2), ModifierSet::from([Modifier::Red]));
    }

    #[test]
    #[should_panic]
    fn get_out_of_range_panics() {
        let line = LineContents::new("abc");
        line.get(10);
    }

    #[test]
    fn empty_buffer_line_has_zero_length() {
        assert_eq!(LineContents::empty().length(), 0);
    }
}
