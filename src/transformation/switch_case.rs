//! `SwitchCase`, spec.md §4.E.7 and DESIGN.md open question 2.

use super::{ApplyContext, GotoPosition, Outcome, Transformation};
use crate::line::LineContents;
use crate::modifiers::Modifiers;
use crate::structure::find_partial_range;

/// Over the partial range, decomposes character by character: characters
/// with a defined, round-tripping case mapping are replaced with their
/// opposite case; characters without one (`to_upper(to_lower(c)) != c`) are
/// left unchanged rather than guessed at.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub modifiers: Modifiers,
}

impl Transformation for SwitchCase {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let origin = outcome.cursor;
        let range = find_partial_range(ctx.contents, &self.modifiers, origin);

        let mut undo_chars: Vec<(crate::position::LineColumn, char)> = Vec::new();
        let mut any_changed = false;

        if range.begin.line == range.end.line {
            let line = range.begin.line;
            let text = ctx.contents.get(line).clone();
            let mut new_text = String::new();
            for (i, c) in text.as_str().chars().enumerate() {
                if i >= range.begin.column && i < range.end.column {
                    if let Some(switched) = switch_case_char(c) {
                        undo_chars.push((crate::position::LineColumn::new(line, i), c));
                        new_text.push(switched);
                        any_changed = true;
                        continue;
                    }
                }
                new_text.push(c);
            }
            ctx.contents.set_line(line, LineContents::with_modifiers(new_text, text.modifiers().clone()));
        }

        outcome.made_progress = any_changed;
        outcome.modified_buffer = any_changed;
        outcome.success = true;
        outcome.cursor = range.end;

        let mut undo = super::TransformationStack::new();
        undo.push(Box::new(RestoreChars {
            line: range.begin.line,
            original: undo_chars,
        }));
        undo.push(Box::new(GotoPosition(origin)));
        outcome.undo_stack = undo;
    }
}

fn switch_case_char(c: char) -> Option<char> {
    if c.is_uppercase() {
        let lower: Vec<char> = c.to_lowercase().collect();
        if lower.len() == 1 && lower[0].to_uppercase().eq([c]) {
            return Some(lower[0]);
        }
        None
    } else if c.is_lowercase() {
        let upper: Vec<char> = c.to_uppercase().collect();
        if upper.len() == 1 && upper[0].to_lowercase().eq([c]) {
            return Some(upper[0]);
        }
        None
    } else {
        None
    }
}

#[derive(Debug, Clone)]
struct RestoreChars {
    line: usize,
    original: Vec<(crate::position::LineColumn, char)>,
}

impl Transformation for RestoreChars {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let text = ctx.contents.get(self.line).clone();
        let mut chars: Vec<char> = text.as_str().chars().collect();
        for (pos, c) in &self.original {
            if pos.column < chars.len() {
                chars[pos.column] = *c;
            }
        }
        let restored: String = chars.into_iter().collect();
        ctx.contents.set_line(self.line, LineContents::with_modifiers(restored, text.modifiers().clone()));
        outcome.success = true;
        outcome.made_progress = !self.original.is_empty();
        outcome.modified_buffer = outcome.made_progress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer_contents::BufferContents;
    use crate::modifiers::Structure;
    use crate::position::LineColumn;
    use crate::transformation::ApplyMode;

    #[test]
    fn two_consecutive_switch_case_round_trips() {
        let mut contents = BufferContents::from_lines(vec![LineContents::new("Hello")]);
        let modifiers = Modifiers {
            structure: Structure::Word,
            repetitions: 1,
            ..Modifiers::default()
        };
        let t = SwitchCase { modifiers };

        let mut ctx = ApplyContext {
            contents: &mut contents,
            modifiers: Modifiers::default(),
            cursors: None,
        };
        let mut outcome = Outcome::new(LineColumn::new(0, 0), ApplyMode::Final);
        t.apply(&mut ctx, &mut outcome);
        let after_first = ctx.contents.get(0).as_str().to_string();
        assert_ne!(after_first, "Hello");

        let mut outcome2 = Outcome::new(LineColumn::new(0, 0), ApplyMode::Final);
        t.apply(&mut ctx, &mut outcome2);
        assert_eq!(ctx.contents.get(0).as_str(), "Hello");
    }
}
