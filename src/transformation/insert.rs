//! `InsertBuffer`, spec.md §4.E.2.

use super::{ApplyContext, ApplyMode, GotoPosition, Outcome, Transformation};
use crate::line::LineContents;
use crate::modifiers::{InsertionMode, ModifierSet};
use crate::position::LineColumn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalPosition {
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct InsertOptions {
    pub contents_to_insert: Vec<LineContents>,
    pub repetitions: usize,
    pub final_position: FinalPosition,
    pub modifiers_override: Option<ModifierSet>,
    pub insertion_mode: InsertionMode,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            contents_to_insert: vec![LineContents::empty()],
            repetitions: 1,
            final_position: FinalPosition::End,
            modifiers_override: None,
            insertion_mode: InsertionMode::Insert,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InsertBuffer(pub InsertOptions);

impl Transformation for InsertBuffer {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let opts = &self.0;
        let origin = outcome.cursor;
        let mut cursor = origin;
        let mut total_chars_inserted = 0usize;

        for _ in 0..opts.repetitions.max(1) {
            cursor = insert_once(ctx, cursor, &opts.contents_to_insert, opts.modifiers_override.as_ref());
            total_chars_inserted += inserted_char_count(&opts.contents_to_insert);
        }

        outcome.made_progress = total_chars_inserted > 0 || opts.contents_to_insert.len() > 1;
        outcome.modified_buffer = outcome.made_progress;
        outcome.success = true;

        let replaced = if opts.insertion_mode == InsertionMode::Replace {
            Some(delete_forward_span(ctx, cursor, total_chars_inserted))
        } else {
            None
        };

        outcome.cursor = match opts.final_position {
            FinalPosition::Start => origin,
            FinalPosition::End => cursor,
        };

        // Undo: go back to where the insert started, then delete exactly
        // what was inserted from there. `GotoPosition(origin)` must run
        // *before* the delete — the cursor after apply() sits wherever
        // `final_position` put it (possibly at the end of the inserted
        // span), and a forward delete issued from there would find nothing
        // left to consume.
        let mut undo = super::TransformationStack::new();
        undo.push(Box::new(GotoPosition(origin)));
        undo.push(Box::new(super::DeleteCharacters(super::delete::DeleteOptions {
            count: Some(total_chars_inserted),
            direction: crate::modifiers::Direction::Forwards,
            copy_to_paste_buffer: false,
            line_end_behavior: super::DeleteLineEndBehavior::Delete,
            delete_type: crate::modifiers::DeleteType::DeleteContents,
        })));
        if let Some(replaced_text) = replaced {
            undo.push(Box::new(InsertBuffer(InsertOptions {
                contents_to_insert: replaced_text,
                repetitions: 1,
                final_position: FinalPosition::Start,
                modifiers_override: None,
                insertion_mode: InsertionMode::Insert,
            })));
        }
        outcome.undo_stack = undo;
    }
}

fn inserted_char_count(lines: &[LineContents]) -> usize {
    if lines.len() == 1 {
        lines[0].length()
    } else {
        // `repetitions - 1` newlines plus each line's length; approximated
        // as total characters across the fragment (newlines counted as the
        // line boundaries introduced).
        lines.iter().map(LineContents::length).sum::<usize>() + lines.len() - 1
    }
}

/// Inserts `lines` once at `pos` by splitting the current line, copying
/// `lines` in, and folding the tail back onto the last inserted line.
/// Returns the position immediately after the inserted text.
fn insert_once(ctx: &mut ApplyContext, pos: LineColumn, lines: &[LineContents], modifiers_override: Option<&ModifierSet>) -> LineColumn {
    if lines.len() == 1 {
        let fragment = match modifiers_override {
            None => lines[0].clone(),
            Some(set) => {
                let overridden = (0..lines[0].length()).map(|c| (c, set.clone())).collect();
                LineContents::with_modifiers(lines[0].as_str(), overridden)
            }
        };
        let existing = ctx.contents.get(pos.line).clone();
        let head = existing.substring(0, pos.column);
        let tail = existing.substring(pos.column, existing.length() - pos.column);
        let new_line = head.append(&fragment).append(&tail);
        ctx.contents.set_line(pos.line, new_line);
        return LineColumn::new(pos.line, pos.column + fragment.length());
    }

    ctx.contents.split_line(pos.line, pos.column);
    ctx.contents.insert(pos.line, &lines[..lines.len() - 1], modifiers_override);
    let last_original_tail_line = pos.line + lines.len();
    ctx.contents.fold_next_line(last_original_tail_line - 1);
    let last_fragment_len = lines[lines.len() - 1].length();
    LineColumn::new(last_original_tail_line - 1, last_fragment_len)
}

/// Deletes `count` characters forward from `pos` (used by `InsertionMode::Replace`)
/// and returns the removed text as line fragments.
fn delete_forward_span(ctx: &mut ApplyContext, pos: LineColumn, count: usize) -> Vec<LineContents> {
    let mut removed = Vec::new();
    let mut remaining = count;
    let mut line = pos.line;
    let mut col = pos.column;
    while remaining > 0 && line < ctx.contents.size() {
        let len = ctx.contents.get(line).length();
        let available = len - col;
        let take = remaining.min(available);
        removed.push(ctx.contents.get(line).substring(col, take));
        ctx.contents.delete_characters_from_line(line, col, Some(take));
        remaining -= take;
        if remaining > 0 && line + 1 < ctx.contents.size() {
            ctx.contents.fold_next_line(line);
        } else {
            break;
        }
        col = col;
    }
    if removed.is_empty() {
        removed.push(LineContents::empty());
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_contents::BufferContents;

    #[test]
    fn insert_single_character_at_end_of_line() {
        let mut contents = BufferContents::from_lines(vec![LineContents::new("hello")]);
        let mut ctx = ApplyContext {
            contents: &mut contents,
            modifiers: crate::modifiers::Modifiers::default(),
            cursors: None,
        };
        let mut outcome = Outcome::new(LineColumn::new(0, 5), ApplyMode::Final);
        let t = InsertBuffer(InsertOptions {
            contents_to_insert: vec![LineContents::new("!")],
            repetitions: 1,
            final_position: FinalPosition::End,
            modifiers_override: None,
            insertion_mode: InsertionMode::Insert,
        });
        t.apply(&mut ctx, &mut outcome);
        assert_eq!(ctx.contents.get(0).as_str(), "hello!");
        assert_eq!(outcome.cursor, LineColumn::new(0, 6));
    }
}
