//! Ordered mutable sequence of lines (component B).
//!
//! The teacher represents a whole buffer as a flat piece table
//! (`src/buffer/rope/mod.rs`); this spec's API is explicitly line-oriented
//! (`split_line`, `fold_next_line`, `delete_characters_from_line`, `sort`),
//! so `BufferContents` is a `Vec<LineContents>` instead, with every mutation
//! publishing a `ContentsChange` descriptor to registered observers so that
//! `CursorsTracker` can rebase and `ParseTreeEngine` can trigger a reparse —
//! the same observer shape the teacher uses for `JobMessage` delivery.

use crate::line::LineContents;
use crate::modifiers::ModifierSet;
use std::ops::Range;

/// Describes what changed so cursor rebasing and reparsing can react without
/// re-diffing the whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentsChange {
    /// Lines `range` were inserted; existing lines at or after `range.start`
    /// shifted down by `range.len()`.
    InsertLines { range: Range<usize> },
    /// Lines `range` (in the buffer's state *before* the removal) were
    /// deleted.
    DeleteLines { range: Range<usize> },
    /// Line `line` was replaced wholesale; no lines shifted.
    ModifyLine { line: usize },
    /// Characters `[col, col+count)` on `line` were removed.
    DeleteCharacters { line: usize, col: usize, count: usize },
    /// `count` characters were inserted at `(line, col)`.
    InsertCharacters { line: usize, col: usize, count: usize },
}

pub trait ContentsObserver {
    fn on_change(&mut self, change: &ContentsChange);
}

#[derive(Default)]
pub struct BufferContents {
    lines: Vec<LineContents>,
    observers: Vec<Box<dyn ContentsObserver>>,
}

impl BufferContents {
    pub fn new() -> Self {
        Self {
            lines: vec![LineContents::empty()],
            observers: Vec::new(),
        }
    }

    pub fn from_lines(lines: Vec<LineContents>) -> Self {
        let lines = if lines.is_empty() {
            vec![LineContents::empty()]
        } else {
            lines
        };
        Self {
            lines,
            observers: Vec::new(),
        }
    }

    pub fn register_observer(&mut self, observer: Box<dyn ContentsObserver>) {
        self.observers.push(observer);
    }

    fn notify(&mut self, change: ContentsChange) {
        for observer in &mut self.observers {
            observer.on_change(&change);
        }
    }

    pub fn size(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, l: usize) -> &LineContents {
        &self.lines[l]
    }

    pub fn at(&self, l: usize) -> Option<&LineContents> {
        self.lines.get(l)
    }

    pub fn back(&self) -> &LineContents {
        self.lines.last().expect("BufferContents invariant: size >= 1")
    }

    pub fn lines(&self) -> &[LineContents] {
        &self.lines
    }

    pub fn push_back(&mut self, line: LineContents) {
        let at = self.lines.len();
        self.lines.push(line);
        self.notify(ContentsChange::InsertLines { range: at..at + 1 });
    }

    pub fn insert_line(&mut self, l: usize, line: LineContents) {
        self.lines.insert(l, line);
        self.notify(ContentsChange::InsertLines { range: l..l + 1 });
    }

    pub fn set_line(&mut self, l: usize, line: LineContents) {
        self.lines[l] = line;
        self.notify(ContentsChange::ModifyLine { line: l });
    }

    /// Removes lines `[first, last)`. If this would leave the buffer empty,
    /// a single empty line is kept (invariant: `size() >= 1`).
    pub fn erase_lines(&mut self, first: usize, last: usize) {
        if first >= last {
            return;
        }
        self.lines.drain(first..last.min(self.lines.len()));
        if self.lines.is_empty() {
            self.lines.push(LineContents::empty());
        }
        self.notify(ContentsChange::DeleteLines { range: first..last });
    }

    /// Splits line `l` at column `pos` into two lines of lengths `pos` and
    /// `original_len - pos`, modifiers preserved on each half.
    pub fn split_line(&mut self, l: usize, pos: usize) {
        let line = &self.lines[l];
        let len = line.length();
        let head = line.substring(0, pos);
        let tail = line.substring(pos, len - pos.min(len));
        self.lines[l] = head;
        self.lines.insert(l + 1, tail);
        self.notify(ContentsChange::InsertLines { range: l + 1..l + 2 });
    }

    /// Joins line `l+1` into line `l`.
    pub fn fold_next_line(&mut self, l: usize) {
        let next = self.lines.remove(l + 1);
        self.lines[l] = self.lines[l].append(&next);
        self.notify(ContentsChange::DeleteLines { range: l + 1..l + 2 });
    }

    /// Deletes a substring from `line` starting at `col`. `count = None`
    /// means "through end of line".
    pub fn delete_characters_from_line(&mut self, line: usize, col: usize, count: Option<usize>) {
        let current = &self.lines[line];
        let len = current.length();
        let col = col.min(len);
        let count = count.unwrap_or(len - col).min(len - col);
        if count == 0 {
            return;
        }
        let head = current.substring(0, col);
        let tail = current.substring(col + count, len - col - count);
        self.lines[line] = head.append(&tail);
        self.notify(ContentsChange::DeleteCharacters { line, col, count });
    }

    pub fn append_to_line(&mut self, line: usize, fragment: &LineContents) {
        let count = fragment.length();
        let col = self.lines[line].length();
        self.lines[line] = self.lines[line].append(fragment);
        self.notify(ContentsChange::InsertCharacters { line, col, count });
    }

    /// Inserts every line of `other` starting at `after_line + 1`. If
    /// `modifiers_override` is present it replaces every inserted line's
    /// per-character modifiers with that single set, applied uniformly.
    pub fn insert(
        &mut self,
        after_line: usize,
        other: &[LineContents],
        modifiers_override: Option<&ModifierSet>,
    ) {
        if other.is_empty() {
            return;
        }
        let at = after_line + 1;
        let to_insert: Vec<LineContents> = other
            .iter()
            .map(|line| match modifiers_override {
                None => line.clone(),
                Some(set) => {
                    let overridden: std::collections::BTreeMap<usize, ModifierSet> =
                        (0..line.length()).map(|c| (c, set.clone())).collect();
                    LineContents::with_modifiers(line.as_str(), overridden)
                }
            })
            .collect();
        let n = to_insert.len();
        for (offset, line) in to_insert.into_iter().enumerate() {
            self.lines.insert(at + offset, line);
        }
        self.notify(ContentsChange::InsertLines { range: at..at + n });
    }

    pub fn sort(&mut self, first: usize, last: usize, comparator: impl Fn(&LineContents, &LineContents) -> std::cmp::Ordering) {
        let last = last.min(self.lines.len());
        if first >= last {
            return;
        }
        self.lines[first..last].sort_by(|a, b| comparator(a, b));
        self.notify(ContentsChange::ModifyLine { line: first });
    }

    /// Returns an observer-free snapshot usable from another thread (e.g.
    /// handed to the parser actor).
    pub fn copy(&self) -> BufferSnapshot {
        BufferSnapshot {
            lines: self.lines.clone(),
        }
    }
}

/// A read-only, `Send`-able view of buffer contents at a point in time.
/// `LineContents` is `Rc`-backed so cloning this is cheap, but the snapshot
/// itself owns its `Vec` and crosses threads only as a whole value, never
/// shared live with the main thread's `BufferContents`.
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
    lines: Vec<LineContents>,
}

impl BufferSnapshot {
    pub fn lines(&self) -> &[LineContents] {
        &self.lines
    }

    pub fn size(&self) -> usize {
        self.lines.len()
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_has_one_empty_line() {
        let b = BufferContents::new();
        assert_eq!(b.size(), 1);
        assert!(b.get(0).is_empty());
    }

    #[test]
    fn split_line_preserves_total_length() {
        let mut b = BufferContents::from_lines(vec![LineContents::new("hello world")]);
        b.split_line(0, 5);
        assert_eq!(b.size(), 2);
        assert_eq!(b.get(0).as_str(), "hello");
        assert_eq!(b.get(1).as_str(), " world");
    }

    #[test]
    fn fold_next_line_joins_lines() {
        let mut b = BufferContents::from_lines(vec![
            LineContents::new("hello"),
            LineContents::new(" world"),
        ]);
        b.fold_next_line(0);
        assert_eq!(b.size(), 1);
        assert_eq!(b.get(0).as_str(), "hello world");
    }

    #[test]
    fn erase_all_lines_keeps_one_empty_line() {
        let mut b = BufferContents::from_lines(vec![LineContents::new("a"), LineContents::new("b")]);
        b.erase_lines(0, 2);
        assert_eq!(b.size(), 1);
        assert!(b.get(0).is_empty());
    }

    #[test]
    fn delete_characters_through_end_of_line() {
        let mut b = BufferContents::from_lines(vec![LineContents::new("hello world")]);
        b.delete_characters_from_line(0, 5, None);
        assert_eq!(b.get(0).as_str(), "hello");
    }

    #[test]
    fn insert_shifts_lines_after_insertion_point() {
        let mut b = BufferContents::from_lines(vec![LineContents::new("a"), LineContents::new("b")]);
        b.insert(0, &[LineContents::new("x"), LineContents::new("y")], None);
        assert_eq!(b.size(), 4);
        assert_eq!(b.get(1).as_str(), "x");
        assert_eq!(b.get(2).as_str(), "y");
        assert_eq!(b.get(3).as_str(), "b");
    }

    struct Recorder(std::rc::Rc<std::cell::RefCell<Vec<ContentsChange>>>);
    impl ContentsObserver for Recorder {
        fn on_change(&mut self, change: &ContentsChange) {
            self.0.borrow_mut().push(change.clone());
        }
    }

    #[test]
    fn mutations_notify_observers() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut b = BufferContents::new();
        b.register_observer(Box::new(Recorder(log.clone())));
        b.push_back(LineContents::new("x"));
        assert_eq!(log.borrow().len(), 1);
    }
}
