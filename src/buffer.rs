//! A named, stateful document: contents + cursors + undo history + variables
//! + optional subprocess (component H).
//!
//! Grounded on `src/document/mod.rs` (file metadata, dirty tracking,
//! save/reload lifecycle) generalized to also own `CursorsTracker`,
//! `UndoHistory`, a `ParseTreeEngine`, and a typed variable bag, and on
//! `src/command_line/settings/{descriptor,registry}.rs` for the variable-bag
//! pattern (a const descriptor table, looked up by name, typed at the point
//! of use).

use crate::buffer_contents::{BufferContents, ContentsChange, ContentsObserver};
use crate::cursors::{CursorsTracker, DEFAULT_CURSORS};
use crate::error::{codes, EdgeError, Result};
use crate::line::LineContents;
use crate::parse_tree::{ParseNode, ParseTreeEngine};
use crate::position::LineColumn;
use crate::subprocess::SubprocessReader;
use crate::modifiers::{CursorsAffected, Modifiers};
use crate::transformation::{ApplyContext, ApplyMode, Outcome, SetCursors, Transformation, TransformationStack};
use crate::undo::{UndoHistory, UndoMode};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A typed value held in a buffer's variable bag.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl VariableValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One entry of the const registry: a name and its default value. Names
/// triggering a tree-parser update are listed separately in
/// `TREE_PARSER_TRIGGERS`.
pub struct VariableDescriptor {
    pub name: &'static str,
    pub default: VariableValue,
}

/// The compile-time-registered variable names from spec.md §3, with their
/// default values.
pub const VARIABLE_DESCRIPTORS: &[VariableDescriptor] = &[
    VariableDescriptor { name: "save_on_close", default: VariableValue::Bool(false) },
    VariableDescriptor { name: "pts", default: VariableValue::Bool(true) },
    VariableDescriptor { name: "follow_end_of_file", default: VariableValue::Bool(false) },
    VariableDescriptor { name: "line_prefix_characters", default: VariableValue::String(String::new()) },
    VariableDescriptor { name: "symbol_characters", default: VariableValue::String(String::new()) },
    VariableDescriptor { name: "tree_parser", default: VariableValue::String(String::new()) },
    VariableDescriptor { name: "language_keywords", default: VariableValue::String(String::new()) },
    VariableDescriptor { name: "typos", default: VariableValue::String(String::new()) },
    VariableDescriptor { name: "allow_dirty_delete", default: VariableValue::Bool(false) },
    VariableDescriptor { name: "term_on_close", default: VariableValue::Bool(false) },
    VariableDescriptor { name: "persist_state", default: VariableValue::Bool(true) },
    VariableDescriptor { name: "reload_after_exit", default: VariableValue::Bool(false) },
    VariableDescriptor { name: "close_after_clean_exit", default: VariableValue::Bool(false) },
];

/// Writing these names triggers `Buffer::update_tree_parser`.
const TREE_PARSER_TRIGGERS: &[&str] = &["symbol_characters", "tree_parser", "language_keywords", "typos"];

fn default_variables() -> HashMap<&'static str, VariableValue> {
    VARIABLE_DESCRIPTORS.iter().map(|d| (d.name, d.default.clone())).collect()
}

/// `Buffer::reload`'s state machine, per spec.md §4.H: a second reload
/// request arriving mid-flight doesn't run concurrently, it just marks that
/// another pass is owed once the current one finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    Done,
    Ongoing,
    Pending,
}

/// Which history stack `apply_history_steps` is replaying into, and
/// therefore which stack receives the freshly-captured inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryDirection {
    Undo,
    Redo,
}

/// Forwards `BufferContents` change notifications into a shared
/// `CursorsTracker`. `Buffer` also keeps its own handle to the same `Rc` so
/// it can read/mutate cursors directly; `BufferContents::register_observer`
/// takes ownership of its observer list, so the tracker itself can't live
/// there and be held by `Buffer` at the same time.
struct CursorsForwarder(Rc<RefCell<CursorsTracker>>);

impl ContentsObserver for CursorsForwarder {
    fn on_change(&mut self, change: &ContentsChange) {
        self.0.borrow_mut().on_change(change);
    }
}

/// A single buffer: contents, cursors, undo history, subprocess, variables.
pub struct Buffer {
    pub name: String,
    pub path: Option<PathBuf>,
    pub contents: BufferContents,
    cursors: Rc<RefCell<CursorsTracker>>,
    pub undo_history: UndoHistory,
    pub parser: ParseTreeEngine,
    variables: HashMap<&'static str, VariableValue>,
    pub subprocess: Option<SubprocessReader>,
    pub dirty: bool,
    pub last_saved_revision: u64,
    revision: u64,
    reload_state: ReloadState,
    pub closed: bool,
}

impl Buffer {
    pub fn new(name: impl Into<String>) -> Self {
        let cursors = Rc::new(RefCell::new(CursorsTracker::new()));
        let mut contents = BufferContents::new();
        contents.register_observer(Box::new(CursorsForwarder(cursors.clone())));
        Self {
            name: name.into(),
            path: None,
            contents,
            cursors,
            undo_history: UndoHistory::new(),
            parser: ParseTreeEngine::null(),
            variables: default_variables(),
            subprocess: None,
            dirty: false,
            last_saved_revision: 0,
            revision: 0,
            reload_state: ReloadState::Done,
            closed: false,
        }
    }

    /// Reads `path`'s bytes into line contents. Fails with `Operational` on
    /// I/O error, matching `src/document/mod.rs::from_file`.
    pub fn from_file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(EdgeError::from)?;
        let mut buffer = Self::new(name);
        let lines: Vec<LineContents> = if text.is_empty() {
            vec![LineContents::empty()]
        } else {
            text.split('\n').map(LineContents::new).collect()
        };
        for (i, line) in lines.into_iter().enumerate() {
            if i == 0 {
                buffer.contents.set_line(0, line);
            } else {
                buffer.contents.push_back(line);
            }
        }
        buffer.path = Some(path.to_path_buf());
        Ok(buffer)
    }

    pub fn cursors(&self) -> std::cell::Ref<'_, CursorsTracker> {
        self.cursors.borrow()
    }

    pub fn cursors_mut(&self) -> std::cell::RefMut<'_, CursorsTracker> {
        self.cursors.borrow_mut()
    }

    pub fn get_variable(&self, name: &str) -> Option<&VariableValue> {
        self.variables.get(name)
    }

    /// Sets a variable by name, validating against its descriptor's type.
    /// Triggers `update_tree_parser` for the names in `TREE_PARSER_TRIGGERS`.
    pub fn set_variable(&mut self, name: &str, value: VariableValue) -> Result<()> {
        let descriptor = VARIABLE_DESCRIPTORS
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| EdgeError::user(codes::UNKNOWN_VARIABLE, format!("no such variable '{name}'")))?;
        if std::mem::discriminant(&descriptor.default) != std::mem::discriminant(&value) {
            return Err(EdgeError::user(codes::BAD_NUMBER, format!("type mismatch setting '{name}'")));
        }
        let key = descriptor.name;
        self.variables.insert(key, value);
        if TREE_PARSER_TRIGGERS.contains(&key) {
            self.update_tree_parser();
        }
        Ok(())
    }

    /// Re-requests a parse with the buffer's current contents. A real
    /// grammar-selection step (choosing a `LanguageParser` from
    /// `tree_parser`/`language_keywords`) belongs to the syntax-highlighting
    /// layer, out of scope here; this just kicks the existing parser.
    fn update_tree_parser(&self) {
        self.parser.request_parse(self.contents.copy());
    }

    pub fn parse_tree(&self) -> std::sync::Arc<ParseNode> {
        self.parser.parse_tree()
    }

    /// Applies `transformation`, recording its inverse in `undo_history` and
    /// updating dirty/revision bookkeeping. Mirrors spec.md §4.E/§4.F: the
    /// buffer is the one place an `Outcome`'s undo stack and
    /// `modified_buffer` flag get committed to history.
    ///
    /// `modifiers.cursors_affected == All` fans `transformation` out across
    /// every cursor in the active set instead of just the current one.
    /// `SetCursors` needs no special case here — `apply_without_undo` already
    /// threads `CursorsTracker` through `ApplyContext`, which is all its
    /// swap needs.
    pub fn apply_transformation(&mut self, transformation: &dyn Transformation, modifiers: &Modifiers) -> Outcome {
        if modifiers.cursors_affected == CursorsAffected::All {
            return self.apply_transformation_all_cursors(transformation);
        }
        let mut outcome = self.apply_without_undo(transformation);
        let undo = Box::new(outcome.undo_stack.take());
        self.push_undo_entry(undo, outcome.modified_buffer);
        outcome
    }

    /// Applies `transformation` once per cursor in the active set, processing
    /// bottommost-first (descending `LineColumn` order) so that an earlier
    /// edit never invalidates a not-yet-visited cursor's position — only
    /// positions after it on the same line could shift, and those were all
    /// already handled on an earlier iteration. The per-cursor undo steps are
    /// merged into one `TransformationStack` and recorded as a single undo
    /// entry, mirroring spec.md §4.E's multi-cursor application semantics.
    fn apply_transformation_all_cursors(&mut self, transformation: &dyn Transformation) -> Outcome {
        let mut positions: Vec<LineColumn> = self.cursors.borrow().active().iter().collect();
        positions.sort_by(|a, b| b.cmp(a));

        let mut combined = TransformationStack::new();
        let mut any_modified = false;
        let mut any_progress = false;
        let mut last_cursor = self.cursors.borrow().active().current();

        for pos in positions {
            let mut ctx = ApplyContext {
                contents: &mut self.contents,
                modifiers: Modifiers::default(),
                cursors: Some(self.cursors.clone()),
            };
            let mut inner = Outcome::new(pos, ApplyMode::Final);
            transformation.apply(&mut ctx, &mut inner);
            any_modified |= inner.modified_buffer;
            any_progress |= inner.made_progress;
            last_cursor = inner.cursor;
            combined.push(Box::new(inner.undo_stack.take()));
        }

        if any_modified {
            self.dirty = true;
            self.revision += 1;
        }
        self.cursors.borrow_mut().active_mut().set_current(last_cursor);

        let mut outcome = Outcome::new(last_cursor, ApplyMode::Final);
        outcome.modified_buffer = any_modified;
        outcome.made_progress = any_progress;
        outcome.undo_stack = combined;
        let undo = Box::new(outcome.undo_stack.take());
        self.push_undo_entry(undo, outcome.modified_buffer);
        outcome
    }

    /// Like `apply_transformation`, but leaves `undo_history` untouched.
    /// Used by `InsertMode` to apply each keystroke immediately while
    /// accumulating the whole insert session's undo into one entry,
    /// committed via `push_undo_entry` once the session closes.
    pub fn apply_without_undo(&mut self, transformation: &dyn Transformation) -> Outcome {
        let cursor = self.cursors.borrow().active().current();
        let mut ctx = ApplyContext {
            contents: &mut self.contents,
            modifiers: crate::modifiers::Modifiers::default(),
            cursors: Some(self.cursors.clone()),
        };
        let mut outcome = Outcome::new(cursor, ApplyMode::Final);
        transformation.apply(&mut ctx, &mut outcome);
        if outcome.modified_buffer {
            self.dirty = true;
            self.revision += 1;
        }
        self.cursors.borrow_mut().active_mut().set_current(outcome.cursor);
        outcome
    }

    pub fn push_undo_entry(&mut self, undo: Box<dyn Transformation>, modified_buffer: bool) {
        self.undo_history.push(undo, modified_buffer);
    }

    /// Undoes the last applied transformation(s), per `mode`/`repetitions`.
    /// Each step's own fresh inverse (the one it produces by virtue of being
    /// applied, not the step itself) is recorded onto `future`, so a
    /// following `redo` replays the original edit rather than undoing it a
    /// second time.
    pub fn undo(&mut self, mode: UndoMode, repetitions: usize) {
        let steps = self.undo_history.take_for_undo(mode, repetitions);
        self.apply_history_steps(steps, HistoryDirection::Undo);
    }

    /// Mirror of `undo`: replays entries popped from `future`, recording
    /// each one's fresh inverse back onto `past`.
    pub fn redo(&mut self, mode: UndoMode, repetitions: usize) {
        let steps = self.undo_history.take_for_redo(mode, repetitions);
        self.apply_history_steps(steps, HistoryDirection::Redo);
    }

    fn apply_history_steps(&mut self, steps: Vec<Box<dyn Transformation>>, direction: HistoryDirection) {
        let cursor = self.cursors.borrow().active().current();
        let mut outcome_cursor = cursor;
        for step in steps {
            let mut ctx = ApplyContext {
                contents: &mut self.contents,
                modifiers: crate::modifiers::Modifiers::default(),
                cursors: Some(self.cursors.clone()),
            };
            let mut inner = Outcome::new(outcome_cursor, ApplyMode::Final);
            step.apply(&mut ctx, &mut inner);
            outcome_cursor = inner.cursor;
            if inner.modified_buffer {
                self.dirty = true;
                self.revision += 1;
            }
            let fresh_inverse = Box::new(inner.undo_stack.take());
            match direction {
                HistoryDirection::Undo => self.undo_history.push_future_entry(fresh_inverse, inner.modified_buffer),
                HistoryDirection::Redo => self.undo_history.push_past_entry(fresh_inverse, inner.modified_buffer),
            }
        }
        self.cursors.borrow_mut().active_mut().set_current(outcome_cursor);
    }

    /// Whether closing should be refused right now, and why. Per spec.md
    /// §4.H: refuse if a subprocess runs without `term_on_close`, or if
    /// dirty without `save_on_close`/`allow_dirty_delete`.
    pub fn prepare_to_close(&mut self) -> std::result::Result<(), String> {
        if self.subprocess.is_some() && !self.variable_bool("term_on_close") {
            return Err(format!("buffer '{}' has a running subprocess", self.name));
        }
        if self.dirty && !self.variable_bool("save_on_close") && !self.variable_bool("allow_dirty_delete") {
            return Err(format!("buffer '{}' has unsaved changes", self.name));
        }
        Ok(())
    }

    fn variable_bool(&self, name: &str) -> bool {
        self.variables.get(name).and_then(VariableValue::as_bool).unwrap_or(false)
    }

    /// Writes the current contents to `self.path`, clearing `dirty`.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| EdgeError::operational(codes::UNRESOLVABLE_PATH, "buffer has no associated path"))?;
        self.write_to_file(&path)?;
        self.last_saved_revision = self.revision;
        self.dirty = false;
        Ok(())
    }

    fn write_to_file(&self, path: &Path) -> Result<()> {
        let text = self
            .contents
            .lines()
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("file");
        let temp_path = parent.join(format!(".{file_name}.tmp"));
        std::fs::write(&temp_path, text).map_err(EdgeError::from)?;
        std::fs::rename(&temp_path, path).map_err(EdgeError::from)?;
        Ok(())
    }

    /// Begins (or schedules) a reload. If a reload is already `Ongoing`,
    /// this just flips the state to `Pending`; the in-flight reload's
    /// completion restarts from there. If a subprocess is running, it is
    /// sent SIGTERM (terminating the child) and `reload_after_exit` is
    /// recorded so the actual reload happens once `end_of_file` fires.
    pub fn request_reload(&mut self) {
        match self.reload_state {
            ReloadState::Done => {
                self.reload_state = ReloadState::Ongoing;
                self.run_reload();
            }
            ReloadState::Ongoing => self.reload_state = ReloadState::Pending,
            ReloadState::Pending => {}
        }
    }

    fn run_reload(&mut self) {
        if let Some(subprocess) = &mut self.subprocess {
            let _ = subprocess.send_interrupt();
            subprocess.set_reload_after_exit(true);
            return;
        }
        if let Some(path) = self.path.clone() {
            if let Ok(text) = std::fs::read_to_string(&path) {
                self.load_text(&text);
            }
        }
        self.complete_reload();
    }

    fn load_text(&mut self, text: &str) {
        let lines: Vec<LineContents> = if text.is_empty() {
            vec![LineContents::empty()]
        } else {
            text.split('\n').map(LineContents::new).collect()
        };
        let old_size = self.contents.size();
        self.contents.erase_lines(0, old_size);
        for (i, line) in lines.into_iter().enumerate() {
            if i == 0 {
                self.contents.set_line(0, line);
            } else {
                self.contents.push_back(line);
            }
        }
        self.dirty = false;
        self.revision += 1;
        self.last_saved_revision = self.revision;
    }

    /// Called once the in-flight reload finishes; if another request arrived
    /// meanwhile (`Pending`), starts a fresh one immediately.
    fn complete_reload(&mut self) {
        match self.reload_state {
            ReloadState::Ongoing => self.reload_state = ReloadState::Done,
            ReloadState::Pending => {
                self.reload_state = ReloadState::Ongoing;
                self.run_reload();
            }
            ReloadState::Done => {}
        }
    }

    pub fn reload_state(&self) -> ReloadState {
        self.reload_state
    }

    /// Called by the editor's scheduler tick when this buffer's subprocess
    /// reports `is_eof()`: fires the end-of-file side effects spec.md §4.I
    /// describes (reload restart, auto-close on clean exit).
    pub fn on_subprocess_eof(&mut self, exit_status_zero: bool) {
        let reload_after_exit = self.subprocess.as_ref().map(|s| s.reload_after_exit()).unwrap_or(false);
        let close_after_clean_exit = self.subprocess.as_ref().map(|s| s.close_after_clean_exit()).unwrap_or(false);
        self.subprocess = None;
        if reload_after_exit {
            self.run_reload();
        } else {
            self.complete_reload();
        }
        if close_after_clean_exit && exit_status_zero {
            self.closed = true;
        }
    }
}

/// Reads/writes the fixed `.edge_state` grammar described in spec.md §6:
/// one `buffer.set_position(line, column)` call and one
/// `buffer.set_<type>_var("name", value)` call per line. This is a
/// line-oriented serializer for a closed grammar, not a general script
/// evaluator (the embedded expression language itself is out of scope).
pub mod persisted_state {
    use super::{Buffer, VariableValue};
    use crate::error::{codes, EdgeError, Result};
    use crate::position::LineColumn;
    use std::io::Write;
    use std::path::Path;

    pub fn write(buffer: &Buffer, path: &Path) -> Result<()> {
        let mut out = String::new();
        let cursor = buffer.cursors().active().current();
        out.push_str(&format!("buffer.set_position({}, {});\n", cursor.line, cursor.column));
        for descriptor in super::VARIABLE_DESCRIPTORS {
            let Some(value) = buffer.get_variable(descriptor.name) else { continue };
            if *value == descriptor.default {
                continue;
            }
            let (kind, literal) = match value {
                VariableValue::Bool(b) => ("bool", b.to_string()),
                VariableValue::Int(i) => ("int", i.to_string()),
                VariableValue::Double(d) => ("double", d.to_string()),
                VariableValue::String(s) => ("string", format!("{s:?}")),
            };
            out.push_str(&format!("buffer.set_{kind}_var({:?}, {literal});\n", descriptor.name));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(EdgeError::from)?;
        }
        let mut file = std::fs::File::create(path).map_err(EdgeError::from)?;
        file.write_all(out.as_bytes()).map_err(EdgeError::from)?;
        Ok(())
    }

    /// Parses the fixed grammar, applying each recognized statement to
    /// `buffer`. Unrecognized lines are ignored rather than erroring, since
    /// a state file predating a removed variable should still load.
    pub fn read(buffer: &mut Buffer, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(EdgeError::from)?;
        for line in text.lines() {
            let line = line.trim().trim_end_matches(';');
            if let Some(args) = line.strip_prefix("buffer.set_position(").and_then(|s| s.strip_suffix(')')) {
                let parts: Vec<&str> = args.split(',').map(str::trim).collect();
                if parts.len() == 2 {
                    if let (Ok(line_no), Ok(col)) = (parts[0].parse::<usize>(), parts[1].parse::<usize>()) {
                        buffer.cursors_mut().active_mut().set_current(LineColumn::new(line_no, col));
                    }
                }
            } else if let Some(rest) = line.strip_prefix("buffer.set_bool_var(") {
                apply_set_var(buffer, rest, |s| VariableValue::Bool(s.parse().unwrap_or(false)))?;
            } else if let Some(rest) = line.strip_prefix("buffer.set_int_var(") {
                apply_set_var(buffer, rest, |s| VariableValue::Int(s.parse().unwrap_or(0)))?;
            } else if let Some(rest) = line.strip_prefix("buffer.set_double_var(") {
                apply_set_var(buffer, rest, |s| VariableValue::Double(s.parse().unwrap_or(0.0)))?;
            } else if let Some(rest) = line.strip_prefix("buffer.set_string_var(") {
                apply_set_var(buffer, rest, |s| VariableValue::String(s.trim_matches('"').to_string()))?;
            }
        }
        Ok(())
    }

    fn apply_set_var(buffer: &mut Buffer, args: &str, parse: impl Fn(&str) -> VariableValue) -> Result<()> {
        let args = args.strip_suffix(')').unwrap_or(args);
        let comma = args
            .find(',')
            .ok_or_else(|| EdgeError::script(codes::SCRIPT_RUNTIME, "malformed set_var statement"))?;
        let name = args[..comma].trim().trim_matches('"');
        let value_text = args[comma + 1..].trim();
        let _ = buffer.set_variable(name, parse(value_text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::{FinalPosition, InsertBuffer, InsertOptions};

    #[test]
    fn new_buffer_starts_clean_with_default_variables() {
        let buffer = Buffer::new("scratch");
        assert!(!buffer.dirty);
        assert_eq!(buffer.get_variable("pts"), Some(&VariableValue::Bool(true)));
    }

    #[test]
    fn set_variable_rejects_unknown_name() {
        let mut buffer = Buffer::new("scratch");
        let err = buffer.set_variable("nonexistent", VariableValue::Bool(true)).unwrap_err();
        assert!(err.to_string().contains("UNKNOWN_VARIABLE"));
    }

    #[test]
    fn set_variable_rejects_type_mismatch() {
        let mut buffer = Buffer::new("scratch");
        let err = buffer.set_variable("save_on_close", VariableValue::Int(1)).unwrap_err();
        assert!(err.to_string().contains("BAD_NUMBER"));
    }

    #[test]
    fn apply_transformation_marks_dirty_and_records_undo() {
        let mut buffer = Buffer::new("scratch");
        let insert = InsertBuffer(InsertOptions {
            contents_to_insert: vec![LineContents::new("hi")],
            repetitions: 1,
            final_position: FinalPosition::End,
            modifiers_override: None,
            insertion_mode: Default::default(),
        });
        buffer.apply_transformation(&insert, &Modifiers::default());
        assert!(buffer.dirty);
        assert_eq!(buffer.contents.get(0).as_str(), "hi");
        assert!(buffer.undo_history.can_undo());
    }

    #[test]
    fn redo_replays_the_original_edit_not_the_undo_again() {
        let mut buffer = Buffer::new("scratch");
        let insert = InsertBuffer(InsertOptions {
            contents_to_insert: vec![LineContents::new("hi")],
            repetitions: 1,
            final_position: FinalPosition::End,
            modifiers_override: None,
            insertion_mode: Default::default(),
        });
        buffer.apply_transformation(&insert, &Modifiers::default());
        assert_eq!(buffer.contents.get(0).as_str(), "hi");

        buffer.undo(UndoMode::OnlyUndoTheLast, 1);
        assert_eq!(buffer.contents.get(0).as_str(), "");

        buffer.redo(UndoMode::OnlyUndoTheLast, 1);
        assert_eq!(buffer.contents.get(0).as_str(), "hi");

        buffer.undo(UndoMode::OnlyUndoTheLast, 1);
        assert_eq!(buffer.contents.get(0).as_str(), "");
    }

    #[test]
    fn apply_transformation_with_cursors_affected_all_edits_every_cursor() {
        use crate::modifiers::CursorsAffected;

        let mut buffer = Buffer::new("scratch");
        buffer.contents.push_back(LineContents::new("ab"));
        buffer.contents.push_back(LineContents::new("ab"));
        buffer.contents.set_line(0, LineContents::new("ab"));
        buffer.cursors_mut().active_mut().insert(LineColumn::new(0, 1));
        buffer.cursors_mut().active_mut().insert(LineColumn::new(1, 1));
        buffer.cursors_mut().active_mut().insert(LineColumn::new(2, 1));

        let insert = InsertBuffer(InsertOptions {
            contents_to_insert: vec![LineContents::new("X")],
            repetitions: 1,
            final_position: FinalPosition::End,
            modifiers_override: None,
            insertion_mode: Default::default(),
        });
        let modifiers = Modifiers { cursors_affected: CursorsAffected::All, ..Modifiers::default() };
        buffer.apply_transformation(&insert, &modifiers);

        assert_eq!(buffer.contents.get(0).as_str(), "aXb");
        assert_eq!(buffer.contents.get(1).as_str(), "aXb");
        assert_eq!(buffer.contents.get(2).as_str(), "aXb");
        assert!(buffer.undo_history.can_undo());

        buffer.undo(UndoMode::OnlyUndoTheLast, 1);
        assert_eq!(buffer.contents.get(0).as_str(), "ab");
        assert_eq!(buffer.contents.get(1).as_str(), "ab");
        assert_eq!(buffer.contents.get(2).as_str(), "ab");
    }

    #[test]
    fn set_cursors_swaps_named_set_and_undo_restores_it() {
        use crate::transformation::CursorsSetSnapshot;

        let mut buffer = Buffer::new("scratch");
        let set_cursors = SetCursors {
            set_name: "marks".to_string(),
            set: CursorsSetSnapshot { positions: vec![LineColumn::new(2, 0)], current: Some(LineColumn::new(2, 0)) },
            make_active: true,
        };
        buffer.apply_transformation(&set_cursors, &Modifiers::default());
        assert_eq!(buffer.cursors().active_name(), "marks");
        assert_eq!(buffer.cursors().active().current(), LineColumn::new(2, 0));

        buffer.undo(UndoMode::OnlyUndoTheLast, 1);
        assert_eq!(buffer.cursors().active_name(), DEFAULT_CURSORS);
    }

    #[test]
    fn prepare_to_close_refuses_when_dirty_without_save_on_close() {
        let mut buffer = Buffer::new("scratch");
        buffer.dirty = true;
        assert!(buffer.prepare_to_close().is_err());
        buffer.set_variable("allow_dirty_delete", VariableValue::Bool(true)).unwrap();
        assert!(buffer.prepare_to_close().is_ok());
    }

    #[test]
    fn persisted_state_round_trips_position_and_variables() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join(".edge_state");

        let mut buffer = Buffer::new("scratch");
        buffer.contents.push_back(LineContents::new("second line"));
        buffer.cursors_mut().active_mut().set_current(LineColumn::new(1, 3));
        buffer.set_variable("save_on_close", VariableValue::Bool(true)).unwrap();
        persisted_state::write(&buffer, &state_path).unwrap();

        let mut reloaded = Buffer::new("scratch");
        reloaded.contents.push_back(LineContents::new("second line"));
        persisted_state::read(&mut reloaded, &state_path).unwrap();

        assert_eq!(reloaded.cursors().active().current(), LineColumn::new(1, 3));
        assert_eq!(reloaded.get_variable("save_on_close"), Some(&VariableValue::Bool(true)));
    }
}
