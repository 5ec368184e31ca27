//! Structure seek primitives and `FindPartialRange` (component J, the
//! behavioral half; the modifier value types live in `modifiers.rs`).
//!
//! Grounded on the teacher's `src/movement/{classify,boundaries,buffer}.rs`
//! (character classification, word-boundary seeking), generalized into a
//! trait over all eight `Structure` variants per spec.md §4.J.

use crate::buffer_contents::BufferContents;
use crate::modifiers::{Boundary, Direction, Modifiers, Structure};
use crate::position::{LineColumn, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Space,
    Word,
    Other,
}

pub fn classify_char(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Space
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceBehavior {
    Forwards,
    Backwards,
}

/// Whether a given position is at the last column of the last line.
fn is_buffer_end(buffer: &BufferContents, pos: LineColumn) -> bool {
    pos.line + 1 >= buffer.size() && pos.column >= buffer.get(pos.line).length()
}

fn is_buffer_start(pos: LineColumn) -> bool {
    pos.line == 0 && pos.column == 0
}

/// Advances `pos` by one character in `direction`, crossing line boundaries.
/// Returns `false` if already at the relevant end of the buffer.
fn step_char(buffer: &BufferContents, pos: &mut LineColumn, direction: Direction) -> bool {
    match direction {
        Direction::Forwards => {
            if is_buffer_end(buffer, *pos) {
                return false;
            }
            let len = buffer.get(pos.line).length();
            if pos.column < len {
                pos.column += 1;
            }
            if pos.column >= len && pos.line + 1 < buffer.size() {
                pos.line += 1;
                pos.column = 0;
            }
            true
        }
        Direction::Backwards => {
            if is_buffer_start(*pos) {
                return false;
            }
            if pos.column > 0 {
                pos.column -= 1;
            } else {
                pos.line -= 1;
                pos.column = buffer.get(pos.line).length();
            }
            true
        }
    }
}

fn char_at(buffer: &BufferContents, pos: LineColumn) -> Option<char> {
    let line = buffer.get(pos.line);
    if pos.column < line.length() {
        Some(line.get(pos.column))
    } else {
        None
    }
}

/// Per-structure seek behavior. `Char` is the degenerate case: every seek
/// moves exactly one character.
pub trait StructureSeek {
    fn seek_to_next(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn);
    fn seek_to_limit(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn) -> bool;
    fn space_behavior(&self) -> SpaceBehavior {
        SpaceBehavior::Forwards
    }
}

pub struct CharStructure;
impl StructureSeek for CharStructure {
    fn seek_to_next(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn) {
        step_char(buffer, pos, direction);
    }
    fn seek_to_limit(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn) -> bool {
        step_char(buffer, pos, direction)
    }
}

pub struct LineStructure;
impl StructureSeek for LineStructure {
    fn seek_to_next(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn) {
        match direction {
            Direction::Forwards if pos.line + 1 < buffer.size() => {
                pos.line += 1;
                pos.column = 0;
            }
            Direction::Backwards if pos.line > 0 => {
                pos.line -= 1;
                pos.column = 0;
            }
            _ => {}
        }
    }
    fn seek_to_limit(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn) -> bool {
        match direction {
            Direction::Forwards => {
                pos.column = buffer.get(pos.line).length();
                true
            }
            Direction::Backwards => {
                pos.column = 0;
                true
            }
        }
    }
}

/// Word structure: seeks across runs of the same character class, skipping
/// whitespace runs between words in the seek direction.
pub struct WordStructure;
impl StructureSeek for WordStructure {
    fn seek_to_next(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn) {
        // Skip the current run, then any whitespace run, landing at the
        // start of the next non-space run (or buffer end).
        let start_class = char_at(buffer, *pos).map(classify_char);
        if let Some(class) = start_class {
            while char_at(buffer, *pos).map(classify_char) == Some(class) {
                if !step_char(buffer, pos, direction) {
                    return;
                }
            }
        }
        while char_at(buffer, *pos).map(classify_char) == Some(CharClass::Space) {
            if !step_char(buffer, pos, direction) {
                return;
            }
        }
    }

    fn seek_to_limit(&self, buffer: &BufferContents, direction: Direction, pos: &mut LineColumn) -> bool {
        let class = match char_at(buffer, *pos).map(classify_char) {
            Some(c) => c,
            None => return false,
        };
        let mut advanced = false;
        loop {
            let next_class = {
                let mut probe = *pos;
                if !step_char(buffer, &mut probe, direction) {
                    break;
                }
                char_at(buffer, probe).map(classify_char)
            };
            if next_class != Some(class) {
                break;
            }
            step_char(buffer, pos, direction);
            advanced = true;
        }
        advanced
    }
}

pub fn structure_seek(structure: Structure) -> Box<dyn StructureSeek> {
    match structure {
        Structure::Char | Structure::Cursor => Box::new(CharStructure),
        Structure::Line | Structure::Page | Structure::Buffer | Structure::Mark | Structure::Search => {
            Box::new(LineStructure)
        }
        Structure::Word => Box::new(WordStructure),
    }
}

/// `FindPartialRange(modifiers, position)` per spec.md §4.J: derives the
/// partial range a region-scoped operation acts over.
pub fn find_partial_range(buffer: &BufferContents, modifiers: &Modifiers, position: LineColumn) -> Range {
    let seek = structure_seek(modifiers.structure);
    let last_line = buffer.size() - 1;
    let position = crate::position::adjust_line_column(position, last_line, |l| buffer.get(l).length());

    match modifiers.direction {
        Direction::Forwards => find_partial_range_forwards(buffer, seek.as_ref(), modifiers, position),
        Direction::Backwards => find_partial_range_backwards(buffer, seek.as_ref(), modifiers, position),
    }
}

/// Forward case: the range runs from `position` to wherever repeated
/// forward seeks land, i.e. "from here to the Nth following structure".
fn find_partial_range_forwards(buffer: &BufferContents, seek: &dyn StructureSeek, modifiers: &Modifiers, position: LineColumn) -> Range {
    let mut begin = position;
    seek.seek_to_next(buffer, Direction::Forwards, &mut begin);
    begin = apply_boundary(buffer, seek, modifiers.boundary_begin, begin, Direction::Backwards);

    let mut end = position.max(begin);
    for _ in 1..modifiers.repetitions.max(1) {
        if !seek.seek_to_limit(buffer, Direction::Forwards, &mut end) {
            break;
        }
        let before = end;
        seek.seek_to_next(buffer, Direction::Forwards, &mut end);
        if end == before {
            break;
        }
    }
    end = apply_boundary(buffer, seek, modifiers.boundary_end, end, Direction::Forwards);

    let mut begin = begin;
    let mut end = end;
    if begin > end {
        std::mem::swap(&mut begin, &mut end);
        step_char(buffer, &mut begin, Direction::Forwards);
    }
    Range::new(begin, end)
}

/// Backward case: the range runs from the start of the structure unit(s)
/// preceding `position` up to `position` itself (exclusive), i.e. "from the
/// Nth preceding structure back up to here".
///
/// This does NOT mirror the forward case by seeking forward from a
/// backward-stepped position: `seek_to_next` walked backwards skips the
/// *whole* current run and lands on the last character of the *preceding*
/// run, not the start of the run the cursor is in. Finding the current
/// run's start instead uses `seek_run_start_backwards` below; extending to
/// further repetitions then uses `seek_to_next` (to cross into the previous
/// run) followed by another `seek_run_start_backwards` (to reach that run's
/// start) — the same two-phase shape the forward case uses with
/// `seek_to_limit`/`seek_to_next`, just reflected.
fn find_partial_range_backwards(buffer: &BufferContents, seek: &dyn StructureSeek, modifiers: &Modifiers, position: LineColumn) -> Range {
    let end = apply_boundary(buffer, seek, modifiers.boundary_end, position, Direction::Backwards);

    let mut begin = position;
    step_char(buffer, &mut begin, Direction::Backwards);
    seek_run_start_backwards(buffer, modifiers.structure, &mut begin);

    for _ in 1..modifiers.repetitions.max(1) {
        let before = begin;
        seek.seek_to_next(buffer, Direction::Backwards, &mut begin);
        if begin == before {
            break;
        }
        seek_run_start_backwards(buffer, modifiers.structure, &mut begin);
    }
    begin = apply_boundary(buffer, seek, modifiers.boundary_begin, begin, Direction::Forwards);

    let mut begin = begin;
    let mut end = end;
    if begin > end {
        std::mem::swap(&mut begin, &mut end);
        step_char(buffer, &mut end, Direction::Backwards);
    }
    Range::new(begin, end)
}

/// Walks `pos` backwards to the start of the run it's currently inside.
/// `Word` runs are contiguous same-class character spans; `Line` runs are
/// whole lines; every coarser structure (`Char` and the page/buffer/
/// mark/search/cursor granularities, which this module treats as single
/// units) has no finer-grained run below the position itself, so it's
/// already at its run's start.
fn seek_run_start_backwards(buffer: &BufferContents, structure: Structure, pos: &mut LineColumn) {
    match structure {
        Structure::Word => {
            let class = match char_at(buffer, *pos).map(classify_char) {
                Some(c) => c,
                None => return,
            };
            loop {
                let mut probe = *pos;
                if !step_char(buffer, &mut probe, Direction::Backwards) {
                    break;
                }
                if char_at(buffer, probe).map(classify_char) != Some(class) {
                    break;
                }
                *pos = probe;
            }
        }
        Structure::Line => pos.column = 0,
        Structure::Char | Structure::Page | Structure::Buffer | Structure::Mark | Structure::Search | Structure::Cursor => {}
    }
}

fn apply_boundary(
    buffer: &BufferContents,
    seek: &dyn StructureSeek,
    boundary: Boundary,
    pos: LineColumn,
    limit_direction: Direction,
) -> LineColumn {
    match boundary {
        Boundary::Current => pos,
        Boundary::LimitCurrent => {
            let mut p = pos;
            seek.seek_to_limit(buffer, limit_direction, &mut p);
            step_char(buffer, &mut p, limit_direction.reverse());
            p
        }
        Boundary::LimitNeighbor => {
            let mut p = pos;
            seek.seek_to_limit(buffer, limit_direction, &mut p);
            seek.seek_to_next(buffer, limit_direction, &mut p);
            seek.seek_to_limit(buffer, limit_direction.reverse(), &mut p);
            p
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineContents;

    fn single_line_buffer(text: &str) -> BufferContents {
        BufferContents::from_lines(vec![LineContents::new(text)])
    }

    #[test]
    fn find_partial_range_begin_never_exceeds_end() {
        let buffer = single_line_buffer("alpha beta gamma");
        let modifiers = Modifiers {
            structure: Structure::Word,
            direction: Direction::Forwards,
            repetitions: 1,
            ..Modifiers::default()
        };
        let range = find_partial_range(&buffer, &modifiers, LineColumn::new(0, 0));
        assert!(range.begin <= range.end);
    }

    #[test]
    fn word_seek_to_next_skips_current_word_and_space() {
        let buffer = single_line_buffer("alpha beta");
        let mut pos = LineColumn::new(0, 0);
        WordStructure.seek_to_next(&buffer, Direction::Forwards, &mut pos);
        assert_eq!(pos, LineColumn::new(0, 6));
    }

    #[test]
    fn classify_char_groups_word_and_space_and_other() {
        assert_eq!(classify_char('a'), CharClass::Word);
        assert_eq!(classify_char(' '), CharClass::Space);
        assert_eq!(classify_char('.'), CharClass::Other);
    }
}
