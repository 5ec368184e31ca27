//! `MapMode`: a key-sequence trie with a default fallback command.
//!
//! Adapted from `src/keymap/trie.rs`'s `TrieNode`/`MatchResult`, generalized
//! from the teacher's `Action` enum to the `Command` trait object so modes
//! outside this crate's scope (file explorer, undo tree) don't leak in.

use super::{Command, InputMode};
use crate::editor::Editor;
use crate::key::Key;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone)]
pub enum MatchResult {
    Exact(Rc<dyn Command>),
    Prefix,
    Ambiguous(Rc<dyn Command>),
    None,
}

#[derive(Clone, Default)]
pub struct TrieNode {
    children: HashMap<Key, TrieNode>,
    action: Option<Rc<dyn Command>>,
}

impl TrieNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keys: &[Key], action: Rc<dyn Command>) {
        if keys.is_empty() {
            self.action = Some(action);
            return;
        }
        self.children.entry(keys[0]).or_default().insert(&keys[1..], action);
    }

    pub fn lookup(&self, keys: &[Key]) -> MatchResult {
        if keys.is_empty() {
            return match (&self.action, self.children.is_empty()) {
                (Some(action), false) => MatchResult::Ambiguous(action.clone()),
                (Some(action), true) => MatchResult::Exact(action.clone()),
                (None, false) => MatchResult::Prefix,
                (None, true) => MatchResult::None,
            };
        }
        match self.children.get(&keys[0]) {
            Some(child) => child.lookup(&keys[1..]),
            None => MatchResult::None,
        }
    }
}

/// Holds a trie from key sequences to commands, a default command run on a
/// branch dead-end, and the sequence typed so far. Each keystroke advances
/// `pending`; on a complete match the command runs and `pending` clears; on
/// a dead end the default command runs once per buffered key.
#[derive(Clone, Default)]
pub struct MapMode {
    trie: TrieNode,
    default: Option<Rc<dyn Command>>,
    pending: Vec<Key>,
}

impl MapMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, keys: &[Key], command: Rc<dyn Command>) {
        self.trie.insert(keys, command);
    }

    pub fn set_default(&mut self, command: Rc<dyn Command>) {
        self.default = Some(command);
    }
}

impl InputMode for MapMode {
    fn process_key(&mut self, key: Key, editor: &mut Editor) {
        self.pending.push(key);
        match self.trie.lookup(&self.pending) {
            MatchResult::Exact(command) | MatchResult::Ambiguous(command) => {
                self.pending.clear();
                run_command(&command, key, editor);
            }
            MatchResult::Prefix => {}
            MatchResult::None => {
                let dead_keys = std::mem::take(&mut self.pending);
                if let Some(default) = &self.default {
                    for k in dead_keys {
                        run_command(default, k, editor);
                    }
                }
            }
        }
    }
}

fn run_command(command: &Rc<dyn Command>, key: Key, editor: &mut Editor) {
    let input = match key {
        Key::Char(c) => c,
        Key::Ctrl(c) => c as char,
        _ => '\0',
    };
    command.process_input(input, editor);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Recording(std::rc::Rc<std::cell::RefCell<Vec<char>>>);
    impl Command for Recording {
        fn description(&self) -> &str {
            "records its input"
        }
        fn category(&self) -> &str {
            "test"
        }
        fn process_input(&self, input: char, _editor: &mut Editor) {
            self.0.borrow_mut().push(input);
        }
    }

    #[test]
    fn exact_sequence_runs_its_command() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut mode = MapMode::new();
        mode.bind(&[Key::Char('g'), Key::Char('g')], Rc::new(Recording(log.clone())));

        let mut editor = Editor::new();
        mode.process_key(Key::Char('g'), &mut editor);
        assert!(log.borrow().is_empty());
        mode.process_key(Key::Char('g'), &mut editor);
        assert_eq!(*log.borrow(), vec!['g']);
    }

    #[test]
    fn dead_end_replays_buffered_keys_through_default() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut mode = MapMode::new();
        mode.bind(&[Key::Char('g'), Key::Char('g')], Rc::new(Recording(std::rc::Rc::new(std::cell::RefCell::new(Vec::new())))));
        mode.set_default(Rc::new(Recording(log.clone())));

        let mut editor = Editor::new();
        mode.process_key(Key::Char('g'), &mut editor);
        mode.process_key(Key::Char('x'), &mut editor);
        assert_eq!(*log.borrow(), vec!['g', 'x']);
    }
}
