//! `FindMode`: one-shot "find character on this line" (spec.md §4.K).

use super::InputMode;
use crate::editor::Editor;
use crate::key::Key;
use crate::modifiers::Direction;
use crate::position::LineColumn;

#[derive(Debug, Clone, Copy)]
pub struct FindMode {
    pub direction: Direction,
    pub repetitions: usize,
}

impl FindMode {
    pub fn new(direction: Direction, repetitions: usize) -> Self {
        Self { direction, repetitions: repetitions.max(1) }
    }
}

impl InputMode for FindMode {
    fn process_key(&mut self, key: Key, editor: &mut Editor) {
        let Key::Char(target) = key else { return };
        let buffer = editor.current_buffer_mut();
        let cursor = buffer.cursors().active().current();
        let line = buffer.contents.get(cursor.line);

        let mut col = cursor.column;
        let mut found = None;
        for _ in 0..self.repetitions {
            match self.direction {
                Direction::Forwards => {
                    let mut c = col + 1;
                    loop {
                        if c >= line.length() {
                            break;
                        }
                        if line.get(c) == target {
                            found = Some(c);
                            break;
                        }
                        c += 1;
                    }
                }
                Direction::Backwards => {
                    let mut c = col;
                    loop {
                        if c == 0 {
                            break;
                        }
                        c -= 1;
                        if line.get(c) == target {
                            found = Some(c);
                            break;
                        }
                    }
                }
            }
            match found {
                Some(c) => col = c,
                None => break,
            }
        }

        if let Some(c) = found {
            buffer.cursors_mut().active_mut().set_current(LineColumn::new(cursor.line, c));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineContents;

    #[test]
    fn finds_nth_forward_occurrence() {
        let mut editor = Editor::new();
        editor.current_buffer_mut().contents.set_line(0, LineContents::new("a.b.c.d"));
        editor.current_buffer_mut().cursors_mut().active_mut().set_current(LineColumn::new(0, 0));

        let mut mode = FindMode::new(Direction::Forwards, 2);
        mode.process_key(Key::Char('.'), &mut editor);

        assert_eq!(editor.current_buffer_mut().cursors_mut().active_mut().current(), LineColumn::new(0, 3));
    }
}
