//! Polymorphic keyboard-input consumers (component K).
//!
//! Grounded on `src/keymap/trie.rs` (`TrieNode`/`MatchResult`, kept nearly
//! as-is — it already matches the spec's key-sequence trie precisely) for
//! `MapMode`, `src/mode.rs` for the mode-as-a-value idea (generalized here
//! into a trait so each mode owns its own behavior instead of being a flat
//! tag matched elsewhere), and `src/action/mod.rs` for the
//! command-as-data pattern (generalized into the `Command` trait).

mod find_mode;
mod insert_mode;
mod map_mode;
mod prompt_mode;
mod repeat_mode;

pub use find_mode::FindMode;
pub use insert_mode::InsertMode;
pub use map_mode::{MapMode, MatchResult, TrieNode};
pub use prompt_mode::PromptMode;
pub use repeat_mode::RepeatMode;

use crate::editor::Editor;
use crate::key::Key;

/// A single bound command: what a complete key sequence (or a default
/// binding) does once triggered.
pub trait Command: std::fmt::Debug {
    fn description(&self) -> &str;
    fn category(&self) -> &str;
    /// `input` is the triggering key's character form (control/arrow keys
    /// pass a sentinel; `MapMode` only needs this for commands that insert
    /// literal text, e.g. the fallback "self-insert" binding).
    fn process_input(&self, input: char, editor: &mut Editor);
}

/// A polymorphic consumer of keyboard events: the active mode decides what
/// each keystroke means.
pub trait InputMode {
    fn process_key(&mut self, key: Key, editor: &mut Editor);
}
