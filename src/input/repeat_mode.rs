//! `RepeatMode`: digits accumulate into the repetitions modifier; any
//! non-digit is forwarded to the wrapped mode (spec.md §4.K).

use super::InputMode;
use crate::editor::Editor;
use crate::key::Key;

pub struct RepeatMode {
    inner: Box<dyn InputMode>,
    accumulated: Option<usize>,
}

impl RepeatMode {
    pub fn new(inner: Box<dyn InputMode>) -> Self {
        Self { inner, accumulated: None }
    }
}

impl InputMode for RepeatMode {
    fn process_key(&mut self, key: Key, editor: &mut Editor) {
        if let Key::Char(c) = key {
            if let Some(digit) = c.to_digit(10) {
                // A leading zero is not a repetition count; forward it like
                // any other non-digit.
                if !(digit == 0 && self.accumulated.is_none()) {
                    self.accumulated = Some(self.accumulated.unwrap_or(0) * 10 + digit as usize);
                    return;
                }
            }
        }
        if let Some(count) = self.accumulated.take() {
            editor.modifiers.repetitions = count;
        }
        self.inner.process_key(key, editor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MapMode;

    #[test]
    fn digits_set_repetitions_before_forwarding() {
        let mut editor = Editor::new();
        let mut mode = RepeatMode::new(Box::new(MapMode::new()));
        mode.process_key(Key::Char('4'), &mut editor);
        mode.process_key(Key::Char('2'), &mut editor);
        assert_eq!(editor.modifiers.repetitions, 1);
        mode.process_key(Key::Char('x'), &mut editor);
        assert_eq!(editor.modifiers.repetitions, 42);
    }
}
