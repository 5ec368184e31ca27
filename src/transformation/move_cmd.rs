//! `Move`, spec.md §4.E.6.

use super::{ApplyContext, GotoPosition, Outcome, Transformation};
use crate::modifiers::{Direction, Structure};
use crate::structure::structure_seek;

/// Advances the cursor by one unit of structure in `direction`, repeated
/// `repetitions` times. `Page` and `Mark` structures need extra context
/// (frozen view size, the target buffer's mark map) that a bare
/// `BufferContents` doesn't carry; callers needing those pass
/// `page_line_count`/use `crate::marks` directly and wrap the result in a
/// plain `GotoPosition` — `Move` here covers `char`/`word`/`line`/`symbol`,
/// which delegate to the structure's seek primitives directly.
#[derive(Debug, Clone)]
pub struct Move {
    pub structure: Structure,
    pub direction: Direction,
    pub repetitions: usize,
}

impl Transformation for Move {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let seek = structure_seek(self.structure);
        let origin = outcome.cursor;
        let mut pos = origin;
        let mut progressed = false;
        for _ in 0..self.repetitions.max(1) {
            let before = pos;
            seek.seek_to_next(ctx.contents, self.direction, &mut pos);
            if pos == before {
                break;
            }
            progressed = true;
        }
        outcome.cursor = pos;
        outcome.made_progress = progressed;
        outcome.modified_buffer = false;
        outcome.success = true;
        outcome.undo_stack.push(Box::new(GotoPosition(origin)));
    }
}

/// Derives a page move's line count from a frozen view size, per spec.md S5:
/// `repetitions * floor(screen_lines * (1 - 2*margin_ratio))`, minimum one
/// line. The caller captures `screen_lines` once at the start of the
/// operation so a concurrent resize never changes an in-flight page move.
pub fn page_line_count(screen_lines: usize, margin_ratio: f64, repetitions: usize) -> usize {
    let usable = ((screen_lines as f64) * (1.0 - 2.0 * margin_ratio)).floor().max(1.0) as usize;
    (usable * repetitions.max(1)).saturating_sub(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_line_count_matches_scenario_s5() {
        // screen_lines=20, margin_ratio=0.1, repetitions=2 => 2*16-1 = 31
        assert_eq!(page_line_count(20, 0.1, 2), 31);
    }

    #[test]
    fn move_word_forwards_advances_past_current_word() {
        use crate::buffer_contents::BufferContents;
        use crate::line::LineContents;
        use crate::position::LineColumn;
        use crate::transformation::ApplyMode;

        let mut contents = BufferContents::from_lines(vec![LineContents::new("alpha beta")]);
        let mut ctx = ApplyContext {
            contents: &mut contents,
            modifiers: crate::modifiers::Modifiers::default(),
            cursors: None,
        };
        let mut outcome = Outcome::new(LineColumn::new(0, 0), ApplyMode::Final);
        let mv = Move {
            structure: Structure::Word,
            direction: Direction::Forwards,
            repetitions: 1,
        };
        mv.apply(&mut ctx, &mut outcome);
        assert_eq!(outcome.cursor, LineColumn::new(0, 6));
    }
}
