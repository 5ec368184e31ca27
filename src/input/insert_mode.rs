//! `InsertMode`: each keystroke produces an `InsertBuffer`, Backspace a
//! backward `DeleteCharacters`; Escape closes the mode and commits the whole
//! session as a single undo entry (spec.md §4.K).

use super::InputMode;
use crate::editor::Editor;
use crate::key::Key;
use crate::line::LineContents;
use crate::modifiers::Direction;
use crate::transformation::{
    DeleteCharacters, DeleteLineEndBehavior, DeleteOptions, InsertBuffer, InsertOptions, Transformation,
    TransformationStack,
};

/// Applied to every inserted character sequence before it reaches the
/// buffer (e.g. smart-indent, bracket-pairing); identity by default.
pub type KeyboardTextTransform = fn(&str) -> String;

fn identity_transform(s: &str) -> String {
    s.to_string()
}

pub struct InsertMode {
    grouped_undo: Vec<Box<dyn Transformation>>,
    transform_keyboard_text: KeyboardTextTransform,
    any_modification: bool,
}

impl InsertMode {
    pub fn new() -> Self {
        Self {
            grouped_undo: Vec::new(),
            transform_keyboard_text: identity_transform,
            any_modification: false,
        }
    }

    pub fn with_keyboard_text_transform(mut self, f: KeyboardTextTransform) -> Self {
        self.transform_keyboard_text = f;
        self
    }

    fn record(&mut self, editor: &mut Editor, transformation: &dyn Transformation) {
        let mut outcome = editor.current_buffer_mut().apply_without_undo(transformation);
        self.any_modification |= outcome.modified_buffer;
        self.grouped_undo.push(Box::new(outcome.undo_stack.take()));
    }

    /// Commits the accumulated keystrokes as a single undo entry.
    fn commit(&mut self, editor: &mut Editor) {
        let steps = std::mem::take(&mut self.grouped_undo);
        if steps.is_empty() {
            return;
        }
        let mut combined = TransformationStack::new();
        for undo in steps.into_iter().rev() {
            combined.push(undo);
        }
        let modified = self.any_modification;
        self.any_modification = false;
        editor.current_buffer_mut().push_undo_entry(Box::new(combined), modified);
    }
}

impl Default for InsertMode {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMode for InsertMode {
    fn process_key(&mut self, key: Key, editor: &mut Editor) {
        match key {
            Key::Char(c) => {
                let text = (self.transform_keyboard_text)(&c.to_string());
                let insert = InsertBuffer(InsertOptions {
                    contents_to_insert: vec![LineContents::new(text)],
                    repetitions: 1,
                    ..InsertOptions::default()
                });
                self.record(editor, &insert);
            }
            Key::Enter => {
                let insert = InsertBuffer(InsertOptions {
                    contents_to_insert: vec![LineContents::empty(), LineContents::empty()],
                    repetitions: 1,
                    ..InsertOptions::default()
                });
                self.record(editor, &insert);
            }
            Key::Backspace => {
                let delete = DeleteCharacters(DeleteOptions {
                    count: Some(1),
                    direction: Direction::Backwards,
                    copy_to_paste_buffer: false,
                    line_end_behavior: DeleteLineEndBehavior::Delete,
                    ..DeleteOptions::default()
                });
                self.record(editor, &delete);
            }
            Key::Tab => {
                // Completion belongs to the script/extension layer; this
                // core only recognizes Tab as a consumed key.
            }
            Key::Escape => {
                self.commit(editor);
                editor.pop_mode();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineContents as LC;

    #[test]
    fn typing_inserts_characters_and_escape_commits_one_undo_entry() {
        let mut editor = Editor::new();
        editor.current_buffer_mut().contents.set_line(0, LC::empty());

        let mut mode = InsertMode::new();
        mode.process_key(Key::Char('h'), &mut editor);
        mode.process_key(Key::Char('i'), &mut editor);
        assert_eq!(editor.current_buffer_mut().contents.get(0).as_str(), "hi");
        assert!(!editor.current_buffer_mut().undo_history.can_undo());

        mode.process_key(Key::Escape, &mut editor);
        assert!(editor.current_buffer_mut().undo_history.can_undo());
        editor.current_buffer_mut().undo(crate::undo::UndoMode::SkipIrrelevant, 1);
        assert_eq!(editor.current_buffer_mut().contents.get(0).as_str(), "");
    }

    #[test]
    fn backspace_deletes_previous_character() {
        let mut editor = Editor::new();
        editor.current_buffer_mut().contents.set_line(0, LC::new("ab"));
        editor
            .current_buffer_mut()
            .cursors_mut()
            .active_mut()
            .set_current(crate::position::LineColumn::new(0, 2));

        let mut mode = InsertMode::new();
        mode.process_key(Key::Backspace, &mut editor);
        assert_eq!(editor.current_buffer_mut().contents.get(0).as_str(), "a");
    }
}
