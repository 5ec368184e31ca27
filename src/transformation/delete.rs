//! `DeleteCharacters`, `DeleteLines`, `Delete` dispatcher, spec.md §4.E.3-5.

use super::insert::{FinalPosition, InsertBuffer, InsertOptions};
use super::{ApplyContext, ApplyMode, GotoPosition, Outcome, Transformation};
use crate::line::LineContents;
use crate::modifiers::{DeleteType, Direction};
use crate::position::LineColumn;
use crate::structure::find_partial_range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteLineEndBehavior {
    Delete,
    Stop,
}

#[derive(Debug, Clone)]
pub struct DeleteOptions {
    pub count: Option<usize>,
    pub direction: Direction,
    pub copy_to_paste_buffer: bool,
    pub line_end_behavior: DeleteLineEndBehavior,
    pub delete_type: DeleteType,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            count: Some(1),
            direction: Direction::Forwards,
            copy_to_paste_buffer: false,
            line_end_behavior: DeleteLineEndBehavior::Delete,
            delete_type: DeleteType::DeleteContents,
        }
    }
}

/// Deletes `count` characters in `direction` starting at the cursor. A
/// newline counts as one character; `Stop` clamps at end-of-line instead of
/// crossing it.
#[derive(Debug, Clone)]
pub struct DeleteCharacters(pub DeleteOptions);

impl Transformation for DeleteCharacters {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let opts = &self.0;
        let origin = outcome.cursor;
        let mut removed: Vec<LineContents> = Vec::new();
        let mut remaining = opts.count.unwrap_or(usize::MAX);
        let mut pos = origin;

        let (mut delete_from, forward) = match opts.direction {
            Direction::Forwards => (origin, true),
            Direction::Backwards => {
                // Compute the start by walking backward first.
                let mut p = origin;
                let mut steps = remaining;
                while steps > 0 && !(p.line == 0 && p.column == 0) {
                    if p.column > 0 {
                        p.column -= 1;
                    } else if opts.line_end_behavior == DeleteLineEndBehavior::Stop {
                        break;
                    } else {
                        p.line -= 1;
                        p.column = ctx.contents.get(p.line).length();
                    }
                    steps -= 1;
                }
                (p, false)
            }
        };
        pos = delete_from;
        let _ = &mut delete_from;

        let mut made_progress = false;
        while remaining > 0 {
            let line_len = ctx.contents.get(pos.line).length();
            let available_on_line = line_len - pos.column;
            if available_on_line == 0 {
                if opts.line_end_behavior == DeleteLineEndBehavior::Stop || pos.line + 1 >= ctx.contents.size() {
                    break;
                }
                ctx.contents.fold_next_line(pos.line);
                removed.push(LineContents::empty());
                remaining -= 1;
                made_progress = true;
                continue;
            }
            let take = available_on_line.min(remaining);
            removed.push(ctx.contents.get(pos.line).substring(pos.column, take));
            ctx.contents.delete_characters_from_line(pos.line, pos.column, Some(take));
            remaining -= take;
            made_progress = true;
        }

        if removed.is_empty() {
            removed.push(LineContents::empty());
        }

        let forward_cursor = pos;
        outcome.made_progress = made_progress;
        outcome.modified_buffer = made_progress;
        outcome.success = true;

        if opts.copy_to_paste_buffer {
            for line in &removed {
                outcome.delete_buffer.push_back(line.clone());
            }
        }

        let deletion_origin = pos;
        let restore_final_position = if forward { FinalPosition::Start } else { FinalPosition::End };

        let mut undo = super::TransformationStack::new();
        undo.push(Box::new(InsertBuffer(InsertOptions {
            contents_to_insert: removed,
            repetitions: 1,
            final_position: restore_final_position,
            modifiers_override: None,
            insertion_mode: crate::modifiers::InsertionMode::Insert,
        })));
        undo.push(Box::new(GotoPosition(deletion_origin)));
        outcome.undo_stack = undo;

        outcome.cursor = if opts.delete_type == DeleteType::PreserveContents && outcome.mode == ApplyMode::Final {
            origin
        } else {
            forward_cursor
        };
        let _ = forward;
    }
}

/// For each of `repetitions` lines starting at the cursor, decomposes into a
/// `DeleteCharacters` over the line's extent. Invokes `activate_on_enter`
/// with `'d'` for each fully-deleted line in `Final` mode.
#[derive(Debug, Clone)]
pub struct DeleteLines {
    pub repetitions: usize,
    pub delete_type: DeleteType,
}

impl Transformation for DeleteLines {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let origin = outcome.cursor;
        let mut removed_lines = Vec::new();
        let count = self.repetitions.max(1).min(ctx.contents.size() - origin.line);

        for offset in 0..count {
            let line_index = origin.line;
            let line = ctx.contents.get(line_index).clone();
            if let crate::line::ActivateOnEnter::Handler { .. } = line.activate_on_enter() {
                if outcome.mode == ApplyMode::Final {
                    // The actual close-buffer side effect is performed by
                    // the owning Buffer/Editor, which inspects this flag.
                    outcome.modified_buffer = true;
                }
            }
            removed_lines.push(line);
            if ctx.contents.size() > 1 {
                ctx.contents.erase_lines(line_index, line_index + 1);
            } else {
                ctx.contents.set_line(line_index, LineContents::empty());
            }
            let _ = offset;
        }

        outcome.made_progress = !removed_lines.is_empty();
        outcome.modified_buffer = outcome.made_progress;
        outcome.success = true;
        outcome.cursor = LineColumn::new(origin.line.min(ctx.contents.size() - 1), 0);

        if self.delete_type == DeleteType::PreserveContents {
            outcome.cursor = origin;
        }

        let mut undo = super::TransformationStack::new();
        undo.push(Box::new(super::insert::InsertBuffer(InsertOptions {
            contents_to_insert: removed_lines,
            repetitions: 1,
            final_position: FinalPosition::Start,
            modifiers_override: None,
            insertion_mode: crate::modifiers::InsertionMode::Insert,
        })));
        undo.push(Box::new(GotoPosition(origin)));
        outcome.undo_stack = undo;
    }
}

/// Dispatcher: computes the partial range via `FindPartialRange`, then
/// composes `GotoPosition(range.begin)` with a character-level delete over
/// the remainder. Preserves the original cursor under `PreserveContents` or
/// `Preview`.
#[derive(Debug, Clone)]
pub struct Delete {
    pub modifiers: crate::modifiers::Modifiers,
    pub copy_to_paste_buffer: bool,
}

impl Transformation for Delete {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let origin = outcome.cursor;
        let range = find_partial_range(ctx.contents, &self.modifiers, origin);

        outcome.cursor = range.begin;
        let char_span = char_distance(ctx.contents, range.begin, range.end);

        let delete = DeleteCharacters(DeleteOptions {
            count: Some(char_span),
            direction: Direction::Forwards,
            copy_to_paste_buffer: self.copy_to_paste_buffer,
            line_end_behavior: DeleteLineEndBehavior::Delete,
            delete_type: self.modifiers.delete_type,
        });
        let mut inner = Outcome::new(range.begin, outcome.mode);
        delete.apply(ctx, &mut inner);

        outcome.made_progress = inner.made_progress;
        outcome.modified_buffer = inner.modified_buffer;
        outcome.success = inner.success;
        outcome.delete_buffer = inner.delete_buffer;

        // Restore the deleted text first (at the deletion site), then move
        // the cursor back to `origin` last — `origin` is the pre-delete
        // cursor, which generally differs from the deletion site
        // (`range.begin`), so restoring the cursor before re-inserting would
        // place the text at the wrong column.
        let mut undo = super::TransformationStack::new();
        for step in inner.undo_stack.clone_steps() {
            undo.push(step);
        }
        undo.push(Box::new(GotoPosition(origin)));
        outcome.undo_stack = undo;

        outcome.cursor = if self.modifiers.delete_type == DeleteType::PreserveContents || outcome.mode == ApplyMode::Preview {
            origin
        } else {
            inner.cursor
        };
    }
}

fn char_distance(contents: &crate::buffer_contents::BufferContents, begin: LineColumn, end: LineColumn) -> usize {
    if begin.line == end.line {
        return end.column - begin.column;
    }
    let mut total = contents.get(begin.line).length() - begin.column + 1; // +1 for the newline
    for line in begin.line + 1..end.line {
        total += contents.get(line).length() + 1;
    }
    total += end.column;
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_contents::BufferContents;
    use crate::modifiers::{Modifiers, Structure};

    #[test]
    fn delete_word_backwards_scenario() {
        let mut contents = BufferContents::from_lines(vec![LineContents::new("alpha beta gamma")]);
        let mut ctx = ApplyContext {
            contents: &mut contents,
            modifiers: Modifiers::default(),
            cursors: None,
        };
        let mut outcome = Outcome::new(LineColumn::new(0, 10), ApplyMode::Final);
        let delete = Delete {
            modifiers: Modifiers {
                structure: Structure::Word,
                direction: Direction::Backwards,
                repetitions: 1,
                delete_type: DeleteType::DeleteContents,
                ..Modifiers::default()
            },
            copy_to_paste_buffer: true,
        };
        delete.apply(&mut ctx, &mut outcome);
        assert_eq!(ctx.contents.get(0).as_str(), "alpha  gamma");
    }
}
