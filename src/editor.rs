//! Process-wide state: buffers, marks, status, input dispatch (component L).
//!
//! Grounded on `src/editor/mod.rs`'s `Editor<T>` (buffer table, dispatcher,
//! modal stack, pending-quit bookkeeping) and `src/state/mod.rs` for the
//! status-line/position-stack shape, generalized away from a terminal-backend
//! type parameter: rendering is out of scope here (§5's event loop owns it),
//! so `Editor` only tracks the state a `Command`/`InputMode` needs to mutate.

use crate::buffer::Buffer;
use crate::input::{Command, InputMode, MapMode};
use crate::key::Key;
use crate::marks::LineMarks;
use crate::modifiers::Modifiers;
use crate::position::LineColumn;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusType {
    Information,
    Warning,
    Prompt,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub kind: StatusType,
    pub text: String,
}

impl Status {
    pub fn information(text: impl Into<String>) -> Self {
        Self { kind: StatusType::Information, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { kind: StatusType::Warning, text: text.into() }
    }
}

type PendingWork = Box<dyn FnOnce(&mut Editor)>;

/// Process-wide editor state. The main thread owns every field; worker
/// threads (syntax parsing, blocking I/O) only ever post closures onto
/// `pending_work`.
pub struct Editor {
    buffers: HashMap<String, Buffer>,
    buffer_order: Vec<String>,
    current_buffer: String,
    pub marks: LineMarks,
    pub status: Option<Status>,
    position_stack: Vec<(String, LineColumn)>,
    pub handling_interrupts: bool,
    pub modifiers: Modifiers,
    root_mode: MapMode,
    mode_stack: Vec<Box<dyn InputMode>>,
    pop_requested: bool,
    pending_work: VecDeque<PendingWork>,
    redraw_ready: bool,
    hard_redraw_ready: bool,
    pub exit_value: Option<i32>,
}

impl Editor {
    pub fn new() -> Self {
        let mut buffers = HashMap::new();
        buffers.insert("scratch".to_string(), Buffer::new("scratch"));
        Self {
            buffers,
            buffer_order: vec!["scratch".to_string()],
            current_buffer: "scratch".to_string(),
            marks: LineMarks::new(),
            status: None,
            position_stack: Vec::new(),
            handling_interrupts: false,
            modifiers: Modifiers::default(),
            root_mode: MapMode::new(),
            mode_stack: Vec::new(),
            pop_requested: false,
            pending_work: VecDeque::new(),
            redraw_ready: true,
            hard_redraw_ready: false,
            exit_value: None,
        }
    }

    pub fn current_buffer(&self) -> &Buffer {
        self.buffers.get(&self.current_buffer).expect("current buffer always exists")
    }

    pub fn current_buffer_mut(&mut self) -> &mut Buffer {
        self.buffers.get_mut(&self.current_buffer).expect("current buffer always exists")
    }

    pub fn buffer(&self, name: &str) -> Option<&Buffer> {
        self.buffers.get(name)
    }

    pub fn buffer_mut(&mut self, name: &str) -> Option<&mut Buffer> {
        self.buffers.get_mut(name)
    }

    pub fn buffer_names(&self) -> &[String] {
        &self.buffer_order
    }

    pub fn insert_buffer(&mut self, buffer: Buffer) {
        let name = buffer.name.clone();
        if !self.buffers.contains_key(&name) {
            self.buffer_order.push(name.clone());
        }
        self.buffers.insert(name, buffer);
    }

    pub fn set_current_buffer(&mut self, name: &str) -> bool {
        if self.buffers.contains_key(name) {
            self.current_buffer = name.to_string();
            true
        } else {
            false
        }
    }

    /// Closes every buffer in `buffer_order`, refusing (and leaving state
    /// untouched) at the first one that `prepare_to_close` rejects.
    pub fn close_buffer(&mut self, name: &str) -> Result<(), String> {
        let buffer = self.buffers.get_mut(name).ok_or_else(|| format!("no such buffer '{name}'"))?;
        buffer.prepare_to_close()?;
        self.buffers.remove(name);
        self.buffer_order.retain(|n| n != name);
        if self.current_buffer == name {
            self.current_buffer = self.buffer_order.first().cloned().unwrap_or_else(|| {
                let fallback = Buffer::new("scratch");
                let fallback_name = fallback.name.clone();
                self.buffers.insert(fallback_name.clone(), fallback);
                fallback_name
            });
            if !self.buffer_order.contains(&self.current_buffer) {
                self.buffer_order.push(self.current_buffer.clone());
            }
        }
        Ok(())
    }

    /// Pushes the current buffer+position so a later command can jump back.
    pub fn push_position(&mut self) {
        let pos = self.current_buffer().cursors().active().current();
        self.position_stack.push((self.current_buffer.clone(), pos));
    }

    pub fn pop_position(&mut self) -> Option<(String, LineColumn)> {
        self.position_stack.pop()
    }

    /// Redirects subsequent keystrokes to `mode` (e.g. entering `InsertMode`
    /// or `PromptMode`) until it pops itself or another mode is pushed.
    pub fn push_mode(&mut self, mode: Box<dyn InputMode>) {
        self.mode_stack.push(mode);
    }

    /// Requests that the active overlay mode (if any) stop receiving
    /// keystrokes after the current `process_key` call returns. Has no
    /// effect on the root map mode, which always has input routed to it.
    pub fn pop_mode(&mut self) {
        self.pop_requested = true;
    }

    pub fn root_mode_mut(&mut self) -> &mut MapMode {
        &mut self.root_mode
    }

    /// Forwards `key` to the redirect mode if one is active, else to the
    /// root map mode. The active mode is taken out of `self` before
    /// dispatch, since its `process_key` takes `&mut Editor` and Rust won't
    /// let it also borrow `self.mode_stack`/`self.root_mode` at the same
    /// time; `pop_requested` records whether to drop it instead of putting
    /// it back.
    pub fn process_input(&mut self, key: Key) {
        self.pop_requested = false;
        match self.mode_stack.pop() {
            Some(mut mode) => {
                mode.process_key(key, self);
                if !self.pop_requested {
                    self.mode_stack.push(mode);
                }
            }
            None => {
                let mut root = std::mem::replace(&mut self.root_mode, MapMode::new());
                root.process_key(key, self);
                self.root_mode = root;
            }
        }
        self.redraw_ready = true;
    }

    pub fn schedule_pending_work(&mut self, work: impl FnOnce(&mut Editor) + 'static) {
        self.pending_work.push_back(Box::new(work));
    }

    /// Drains the deferred-closure queue, returning whether it's now empty
    /// (the event loop uses this to decide how long it may sleep).
    pub fn run_pending_work(&mut self) -> bool {
        while let Some(work) = self.pending_work.pop_front() {
            work(self);
        }
        self.pending_work.is_empty()
    }

    pub fn request_redraw(&mut self) {
        self.redraw_ready = true;
    }

    pub fn request_hard_redraw(&mut self) {
        self.hard_redraw_ready = true;
        self.redraw_ready = true;
    }

    pub fn take_redraw_ready(&mut self) -> bool {
        std::mem::replace(&mut self.redraw_ready, false)
    }

    pub fn take_hard_redraw_ready(&mut self) -> bool {
        std::mem::replace(&mut self.hard_redraw_ready, false)
    }

    pub fn bind_root(&mut self, keys: &[Key], command: Rc<dyn Command>) {
        self.root_mode_mut().bind(keys, command);
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineContents;

    #[test]
    fn new_editor_has_a_scratch_buffer_as_current() {
        let editor = Editor::new();
        assert_eq!(editor.current_buffer().name, "scratch");
    }

    #[test]
    fn process_input_reaches_a_root_bound_command() {
        #[derive(Debug)]
        struct InsertX;
        impl Command for InsertX {
            fn description(&self) -> &str {
                "inserts x"
            }
            fn category(&self) -> &str {
                "test"
            }
            fn process_input(&self, _input: char, editor: &mut Editor) {
                editor.current_buffer_mut().contents.set_line(0, LineContents::new("x"));
            }
        }

        let mut editor = Editor::new();
        editor.bind_root(&[Key::Char('z')], Rc::new(InsertX));
        editor.process_input(Key::Char('z'));
        assert_eq!(editor.current_buffer().contents.get(0).as_str(), "x");
    }

    #[test]
    fn close_buffer_refuses_when_dirty() {
        let mut editor = Editor::new();
        editor.current_buffer_mut().dirty = true;
        assert!(editor.close_buffer("scratch").is_err());
    }

    #[test]
    fn pending_work_runs_in_order() {
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut editor = Editor::new();
        for i in 0..3 {
            let log = log.clone();
            editor.schedule_pending_work(move |_| log.borrow_mut().push(i));
        }
        assert!(editor.run_pending_work());
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }
}
