//! End-to-end scenario tests (spec.md §8, S1-S3) exercised against the
//! transformation algebra directly, without a full `Buffer`/`Editor`.

use super::*;
use crate::buffer_contents::BufferContents;
use crate::line::LineContents;
use crate::modifiers::{DeleteType, Direction, InsertionMode, Modifiers, Structure};
use crate::position::LineColumn;

fn apply(contents: &mut BufferContents, cursor: LineColumn, t: &dyn Transformation) -> Outcome {
    let mut ctx = ApplyContext {
        contents,
        modifiers: Modifiers::default(),
        cursors: None,
    };
    let mut outcome = Outcome::new(cursor, ApplyMode::Final);
    t.apply(&mut ctx, &mut outcome);
    outcome
}

#[test]
fn s1_insert_single_character() {
    let mut contents = BufferContents::from_lines(vec![LineContents::new("hello")]);
    let t = InsertBuffer(InsertOptions {
        contents_to_insert: vec![LineContents::new("!")],
        repetitions: 1,
        final_position: FinalPosition::End,
        modifiers_override: None,
        insertion_mode: InsertionMode::Insert,
    });
    let outcome = apply(&mut contents, LineColumn::new(0, 5), &t);
    assert_eq!(contents.get(0).as_str(), "hello!");
    assert_eq!(outcome.cursor, LineColumn::new(0, 6));

    // Undo restores contents and cursor.
    let undo = outcome.undo_stack;
    let restore = apply(&mut contents, outcome.cursor, &undo);
    assert_eq!(contents.get(0).as_str(), "hello");
    assert_eq!(restore.cursor, LineColumn::new(0, 5));
}

#[test]
fn s2_delete_word_backwards() {
    let mut contents = BufferContents::from_lines(vec![LineContents::new("alpha beta gamma")]);
    let t = Delete {
        modifiers: Modifiers {
            structure: Structure::Word,
            direction: Direction::Backwards,
            repetitions: 1,
            delete_type: DeleteType::DeleteContents,
            ..Modifiers::default()
        },
        copy_to_paste_buffer: true,
    };
    let outcome = apply(&mut contents, LineColumn::new(0, 10), &t);
    assert_eq!(contents.get(0).as_str(), "alpha  gamma");
    assert_eq!(outcome.cursor, LineColumn::new(0, 6));
    assert_eq!(outcome.delete_buffer.get(0).as_str(), "beta");

    let undo = outcome.undo_stack;
    apply(&mut contents, outcome.cursor, &undo);
    assert_eq!(contents.get(0).as_str(), "alpha beta gamma");
}

#[test]
fn s3_multi_cursor_character_insert() {
    let mut contents = BufferContents::from_lines(vec![
        LineContents::new("ab"),
        LineContents::new("ab"),
        LineContents::new("ab"),
    ]);
    let cursors = [LineColumn::new(0, 1), LineColumn::new(1, 1), LineColumn::new(2, 1)];

    let mut new_cursors = Vec::new();
    let mut combined_undo = TransformationStack::new();
    for &cursor in &cursors {
        let t = InsertBuffer(InsertOptions {
            contents_to_insert: vec![LineContents::new("X")],
            repetitions: 1,
            final_position: FinalPosition::End,
            modifiers_override: None,
            insertion_mode: InsertionMode::Insert,
        });
        let outcome = apply(&mut contents, cursor, &t);
        new_cursors.push(outcome.cursor);
        combined_undo.push(Box::new(outcome.undo_stack));
    }

    assert_eq!(contents.get(0).as_str(), "aXb");
    assert_eq!(contents.get(1).as_str(), "aXb");
    assert_eq!(contents.get(2).as_str(), "aXb");
    assert_eq!(new_cursors, vec![LineColumn::new(0, 2), LineColumn::new(1, 2), LineColumn::new(2, 2)]);
}

#[test]
fn find_partial_range_begin_le_end_property() {
    let contents = BufferContents::from_lines(vec![LineContents::new("one two three")]);
    for structure in [Structure::Char, Structure::Word, Structure::Line] {
        for direction in [Direction::Forwards, Direction::Backwards] {
            let modifiers = Modifiers {
                structure,
                direction,
                repetitions: 2,
                ..Modifiers::default()
            };
            let range = crate::structure::find_partial_range(&contents, &modifiers, LineColumn::new(0, 5));
            assert!(range.begin <= range.end);
        }
    }
}

#[test]
fn push_pop_stack_with_no_applications_is_a_no_op() {
    let mut stack = TransformationStack::new();
    assert!(stack.is_empty());
    let popped = stack.take();
    assert!(popped.is_empty());
    assert!(stack.is_empty());
}
