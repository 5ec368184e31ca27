//! `PromptMode`: a single-line input buffer backed by a live-filtered
//! history (spec.md §4.K).

use super::InputMode;
use crate::editor::Editor;
use crate::key::Key;

/// Ranks a history line by the sum of the line numbers at which it occurs
/// (only over lines containing `needle`), so an entry used often and
/// recently outranks one used once long ago. Sorted ascending, most relevant
/// last — `ArrowUp` from the prompt's empty/bottom state reaches the best
/// match first.
fn filter_and_rank(history: &[String], needle: &str) -> Vec<String> {
    use std::collections::HashMap;
    let mut scores: HashMap<&str, usize> = HashMap::new();
    for (line_number, line) in history.iter().enumerate() {
        if needle.is_empty() || line.contains(needle) {
            *scores.entry(line.as_str()).or_insert(0) += line_number;
        }
    }
    let mut ranked: Vec<(&str, usize)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| a.1.cmp(&b.1));
    ranked.into_iter().map(|(s, _)| s.to_string()).collect()
}

pub struct PromptMode {
    pub prompt: String,
    input: String,
    cursor: usize,
    history: Vec<String>,
    filtered: Vec<String>,
    selected: Option<usize>,
    on_commit: Box<dyn FnMut(&str, &mut Editor)>,
    on_cancel: Box<dyn FnMut(&mut Editor)>,
    colorize: Option<Box<dyn Fn(&str) -> String>>,
}

impl PromptMode {
    pub fn new(
        prompt: impl Into<String>,
        history: Vec<String>,
        on_commit: impl FnMut(&str, &mut Editor) + 'static,
        on_cancel: impl FnMut(&mut Editor) + 'static,
    ) -> Self {
        let filtered = filter_and_rank(&history, "");
        Self {
            prompt: prompt.into(),
            input: String::new(),
            cursor: 0,
            history,
            filtered,
            selected: None,
            on_commit: Box::new(on_commit),
            on_cancel: Box::new(on_cancel),
            colorize: None,
        }
    }

    pub fn with_colorize(mut self, colorize: impl Fn(&str) -> String + 'static) -> Self {
        self.colorize = Some(Box::new(colorize));
        self
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn colorized(&self) -> Option<String> {
        self.colorize.as_ref().map(|f| f(&self.input))
    }

    fn refilter(&mut self) {
        self.filtered = filter_and_rank(&self.history, &self.input);
        self.selected = None;
    }

    fn set_input(&mut self, text: String) {
        self.cursor = text.chars().count();
        self.input = text;
    }
}

impl InputMode for PromptMode {
    fn process_key(&mut self, key: Key, editor: &mut Editor) {
        match key {
            Key::Char(c) => {
                let byte_index: usize = self.input.char_indices().nth(self.cursor).map(|(i, _)| i).unwrap_or(self.input.len());
                self.input.insert(byte_index, c);
                self.cursor += 1;
                self.refilter();
            }
            Key::Backspace => {
                if self.cursor > 0 {
                    let byte_index: usize = self.input.char_indices().nth(self.cursor - 1).map(|(i, _)| i).unwrap();
                    self.input.remove(byte_index);
                    self.cursor -= 1;
                    self.refilter();
                }
            }
            Key::ArrowLeft => self.cursor = self.cursor.saturating_sub(1),
            Key::ArrowRight => self.cursor = (self.cursor + 1).min(self.input.chars().count()),
            Key::Home => self.cursor = 0,
            Key::End => self.cursor = self.input.chars().count(),
            Key::ArrowDown => {
                if self.filtered.is_empty() {
                    return;
                }
                let next = match self.selected {
                    None => 0,
                    Some(i) => (i + 1).min(self.filtered.len() - 1),
                };
                self.selected = Some(next);
                self.set_input(self.filtered[next].clone());
            }
            Key::ArrowUp => {
                if self.filtered.is_empty() {
                    return;
                }
                let prev = match self.selected {
                    None => 0,
                    Some(0) => 0,
                    Some(i) => i - 1,
                };
                self.selected = Some(prev);
                self.set_input(self.filtered[prev].clone());
            }
            Key::Enter => {
                let text = self.input.clone();
                (self.on_commit)(&text, editor);
                editor.pop_mode();
            }
            Key::Escape => {
                (self.on_cancel)(editor);
                editor.pop_mode();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_filters_history_by_substring() {
        let history = vec!["alpha".to_string(), "beta".to_string(), "alphabet".to_string()];
        let mut editor = Editor::new();
        let mut mode = PromptMode::new(":", history, |_, _| {}, |_| {});
        mode.process_key(Key::Char('a'), &mut editor);
        mode.process_key(Key::Char('l'), &mut editor);
        assert!(mode.filtered.iter().all(|s| s.contains("al")));
        assert!(mode.filtered.contains(&"alpha".to_string()));
        assert!(mode.filtered.contains(&"alphabet".to_string()));
        assert!(!mode.filtered.contains(&"beta".to_string()));
    }

    #[test]
    fn frequent_recent_entry_ranks_last() {
        let history = vec!["foo".to_string(), "bar".to_string(), "foo".to_string()];
        let ranked = filter_and_rank(&history, "");
        assert_eq!(ranked.last(), Some(&"foo".to_string()));
    }

    #[test]
    fn rank_order_matches_scenario_s6() {
        // "ab" appears once (line 0, score 0), "abc" once (line 1, score 1),
        // "cab" once (line 2, score 2): ascending by score => [ab, abc, cab].
        let history = vec!["ab".to_string(), "abc".to_string(), "cab".to_string()];
        let ranked = filter_and_rank(&history, "ab");
        assert_eq!(ranked, vec!["ab".to_string(), "abc".to_string(), "cab".to_string()]);
    }

    #[test]
    fn enter_commits_current_input() {
        let committed = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
        let committed_clone = committed.clone();
        let mut editor = Editor::new();
        let mut mode = PromptMode::new(
            ":",
            vec![],
            move |text, _editor| *committed_clone.borrow_mut() = text.to_string(),
            |_| {},
        );
        mode.process_key(Key::Char('h'), &mut editor);
        mode.process_key(Key::Char('i'), &mut editor);
        mode.process_key(Key::Enter, &mut editor);
        assert_eq!(*committed.borrow(), "hi");
    }
}
