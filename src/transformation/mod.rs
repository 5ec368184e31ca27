//! The transformation algebra (component E, the core of the editor).
//!
//! No single teacher file corresponds to this module (the teacher's editing
//! commands mutate immediately rather than producing a reified, invertible
//! value) — grounded on `src/history/mod.rs`'s `EditOperation::inverse()` for
//! the insert/delete duality, and `original_source/src/transformation.h` /
//! `transformation/stack.cc` for the dispatcher and stack-composition shape.

mod delete;
mod insert;
mod move_cmd;
mod switch_case;

pub use delete::{Delete, DeleteCharacters, DeleteLineEndBehavior, DeleteLines, DeleteOptions};
pub use insert::{FinalPosition, InsertBuffer, InsertOptions};
pub use move_cmd::Move;
pub use switch_case::SwitchCase;

use crate::buffer_contents::BufferContents;
use crate::cursors::{CursorsSet, CursorsTracker};
use crate::modifiers::Modifiers;
use crate::position::LineColumn;
use std::cell::RefCell;
use std::rc::Rc;

/// Whether a transformation's effects are committed or a preview overlay
/// that may be reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Final,
    Preview,
}

/// Mutable state threaded through a transformation's application; what the
/// spec calls `Result`. Renamed to avoid colliding with `std::result::Result`.
pub struct Outcome {
    pub cursor: LineColumn,
    pub success: bool,
    pub made_progress: bool,
    pub modified_buffer: bool,
    pub undo_stack: TransformationStack,
    pub delete_buffer: BufferContents,
    pub mode: ApplyMode,
}

impl Outcome {
    pub fn new(cursor: LineColumn, mode: ApplyMode) -> Self {
        Self {
            cursor,
            success: true,
            made_progress: false,
            modified_buffer: false,
            undo_stack: TransformationStack::new(),
            delete_buffer: BufferContents::new(),
            mode,
        }
    }
}

/// Everything a transformation needs to mutate in place: the buffer contents
/// and (optionally) the ambient modifiers that parameterize structure-based
/// transformations like `Move` and `Delete`.
pub struct ApplyContext<'a> {
    pub contents: &'a mut BufferContents,
    pub modifiers: Modifiers,
    /// The owning buffer's cursor tracker, when one is reachable. Only
    /// `SetCursors` needs it (its swap touches `CursorsTracker`, not
    /// `BufferContents`); every other transformation ignores this field.
    /// `None` in contexts with no buffer behind them (bare unit tests
    /// exercising the transformation algebra directly).
    pub cursors: Option<Rc<RefCell<CursorsTracker>>>,
}

/// A value that, applied to a buffer, mutates it and yields an inverse.
/// Mirrors the teacher's `EditOperation` trait shape
/// (`src/history/mod.rs::EditOperation`) generalized to a closed algebra of
/// concrete variants rather than open trait-object extension points defined
/// outside this crate.
pub trait Transformation: TransformationClone + std::fmt::Debug {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome);
}

/// Object-safe clone for `Box<dyn Transformation>`, blanket-implemented for
/// any concrete, `Clone` transformation.
pub trait TransformationClone {
    fn clone_box(&self) -> Box<dyn Transformation>;
}

impl<T> TransformationClone for T
where
    T: 'static + Transformation + Clone,
{
    fn clone_box(&self) -> Box<dyn Transformation> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Transformation> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Sets the cursor directly; its own undo is `GotoPosition(old_cursor)`.
/// Never fails.
#[derive(Debug, Clone)]
pub struct GotoPosition(pub LineColumn);

impl Transformation for GotoPosition {
    fn apply(&self, _ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let old = outcome.cursor;
        outcome.cursor = self.0;
        outcome.success = true;
        outcome.made_progress = old != self.0;
        outcome.undo_stack.push(Box::new(GotoPosition(old)));
    }
}

/// An ordered list of transformations applied sequentially, threading
/// `cursor` and accumulating a single undo stack in reverse order.
#[derive(Debug, Clone, Default)]
pub struct TransformationStack {
    steps: Vec<Box<dyn Transformation>>,
}

impl TransformationStack {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, t: Box<dyn Transformation>) {
        self.steps.push(t);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Takes ownership of the accumulated steps, leaving this stack empty.
    pub fn take(&mut self) -> TransformationStack {
        std::mem::take(self)
    }

    /// Returns a clone of the accumulated steps without consuming the stack.
    pub fn clone_steps(&self) -> Vec<Box<dyn Transformation>> {
        self.steps.clone()
    }
}

impl Transformation for TransformationStack {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let mut undo_steps: Vec<Box<dyn Transformation>> = Vec::new();
        for step in &self.steps {
            let mut inner = Outcome::new(outcome.cursor, outcome.mode);
            step.apply(ctx, &mut inner);
            outcome.cursor = inner.cursor;
            outcome.made_progress |= inner.made_progress;
            outcome.modified_buffer |= inner.modified_buffer;
            if !inner.success {
                outcome.success = false;
                // Undo everything already applied, in reverse, then stop.
                undo_steps.extend(inner.undo_stack.steps.into_iter().rev());
                break;
            }
            undo_steps.extend(inner.undo_stack.steps.into_iter().rev());
        }
        // The stack's own undo is the concatenation of inverses in reverse
        // application order.
        undo_steps.reverse();
        outcome.undo_stack.push(Box::new(TransformationStack { steps: undo_steps }));
    }
}

/// Temporarily overrides the repetitions modifier for `inner`'s application.
#[derive(Debug, Clone)]
pub struct SetRepetitions {
    pub repetitions: usize,
    pub inner: Box<dyn Transformation>,
}

impl Transformation for SetRepetitions {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let saved = ctx.modifiers.repetitions;
        ctx.modifiers.repetitions = self.repetitions;
        self.inner.apply(ctx, outcome);
        ctx.modifiers.repetitions = saved;
    }
}

/// Temporarily overrides the direction modifier for `inner`'s application.
#[derive(Debug, Clone)]
pub struct DirectionWrapper {
    pub direction: crate::modifiers::Direction,
    pub inner: Box<dyn Transformation>,
}

impl Transformation for DirectionWrapper {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let saved = ctx.modifiers.direction;
        ctx.modifiers.direction = self.direction;
        self.inner.apply(ctx, outcome);
        ctx.modifiers.direction = saved;
    }
}

/// Temporarily overrides the structure and repetitions modifiers for
/// `inner`'s application.
#[derive(Debug, Clone)]
pub struct StructureWrapper {
    pub structure: crate::modifiers::Structure,
    pub repetitions: usize,
    pub inner: Box<dyn Transformation>,
}

impl Transformation for StructureWrapper {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let saved_structure = ctx.modifiers.structure;
        let saved_repetitions = ctx.modifiers.repetitions;
        ctx.modifiers.structure = self.structure;
        ctx.modifiers.repetitions = self.repetitions;
        self.inner.apply(ctx, outcome);
        ctx.modifiers.structure = saved_structure;
        ctx.modifiers.repetitions = saved_repetitions;
    }
}

/// Runs `inner` up to `count` times, stopping early on `success=false` or
/// `made_progress=false`.
#[derive(Debug, Clone)]
pub struct ApplyRepetitions {
    pub count: usize,
    pub inner: Box<dyn Transformation>,
}

impl Transformation for ApplyRepetitions {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let mut undo_steps: Vec<Box<dyn Transformation>> = Vec::new();
        for _ in 0..self.count {
            let mut inner = Outcome::new(outcome.cursor, outcome.mode);
            self.inner.apply(ctx, &mut inner);
            outcome.cursor = inner.cursor;
            outcome.modified_buffer |= inner.modified_buffer;
            undo_steps.extend(inner.undo_stack.steps.into_iter().rev());
            if !inner.success || !inner.made_progress {
                outcome.success = inner.success;
                outcome.made_progress = inner.made_progress || outcome.made_progress;
                break;
            }
            outcome.made_progress = true;
            outcome.success = true;
        }
        undo_steps.reverse();
        outcome.undo_stack.push(Box::new(TransformationStack { steps: undo_steps }));
    }
}

/// Replaces a named cursor set's positions and optionally makes it active;
/// its undo restores the prior set (and the prior active set, if it changed
/// one). Reaches `ctx.cursors` directly since cursor sets live on
/// `CursorsTracker`, not `BufferContents`; a no-op, successful apply when no
/// tracker is reachable (bare algebra tests with no owning buffer).
#[derive(Debug, Clone)]
pub struct SetCursors {
    pub set_name: String,
    pub set: CursorsSetSnapshot,
    pub make_active: bool,
}

/// A plain-data copy of a `CursorsSet`'s positions, since `CursorsSet` itself
/// isn't `Clone`-cheap across an undo boundary by reference.
#[derive(Debug, Clone, Default)]
pub struct CursorsSetSnapshot {
    pub positions: Vec<LineColumn>,
    pub current: Option<LineColumn>,
}

impl From<&CursorsSet> for CursorsSetSnapshot {
    fn from(set: &CursorsSet) -> Self {
        Self {
            positions: set.iter().collect(),
            current: Some(set.current()),
        }
    }
}

impl Transformation for SetCursors {
    fn apply(&self, ctx: &mut ApplyContext, outcome: &mut Outcome) {
        let Some(cursors) = ctx.cursors.clone() else {
            outcome.success = true;
            return;
        };
        let mut tracker = cursors.borrow_mut();
        let previous_active_name = tracker.active_name().to_string();
        let previous_set_snapshot = CursorsSetSnapshot::from(&*tracker.find_or_create(&self.set_name));

        tracker.find_or_create(&self.set_name).replace_from_snapshot(&self.set);

        let mut undo = TransformationStack::new();
        undo.push(Box::new(SetCursors {
            set_name: self.set_name.clone(),
            set: previous_set_snapshot,
            make_active: false,
        }));

        if self.make_active && previous_active_name != self.set_name {
            let previous_active_snapshot = CursorsSetSnapshot::from(&*tracker.find_or_create(&previous_active_name));
            tracker.set_active(&self.set_name);
            undo.push(Box::new(SetCursors {
                set_name: previous_active_name,
                set: previous_active_snapshot,
                make_active: true,
            }));
        }

        outcome.cursor = tracker.active().current();
        outcome.success = true;
        outcome.made_progress = true;
        outcome.undo_stack = undo;
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
