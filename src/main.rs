//! CLI entry point: `edge [--fork-command cmd]* [--path-history p]* paths...`.
//! Argument parsing is hand-rolled, matching the absence of a CLI-parsing
//! dependency in both the teacher and the upstream C++ editor this core is
//! modeled on.

use edge::buffer::Buffer;
use edge::editor::Editor;
use edge::input::Command;
use edge::key::Key;
use std::rc::Rc;

/// `:w` equivalent: saves the current buffer. A stand-in for the real
/// script-bound commands an external engine would register via `AddBinding`.
#[derive(Debug)]
struct SaveCommand;

impl Command for SaveCommand {
    fn description(&self) -> &str {
        "save the current buffer"
    }
    fn category(&self) -> &str {
        "buffer"
    }
    fn process_input(&self, _input: char, editor: &mut Editor) {
        if let Err(err) = editor.current_buffer_mut().save() {
            log::warn!("save failed: {err}");
        }
    }
}

#[derive(Debug)]
struct QuitCommand;

impl Command for QuitCommand {
    fn description(&self) -> &str {
        "quit the editor"
    }
    fn category(&self) -> &str {
        "editor"
    }
    fn process_input(&self, _input: char, editor: &mut Editor) {
        editor.exit_value = Some(0);
    }
}

/// A `+`-prefixed leading path: a command to evaluate in the initial buffer
/// once loaded. Evaluating it requires the external script engine (out of
/// scope for this core), so it is only recorded for that layer to consume.
#[derive(Debug, Clone)]
struct PendingCommand(String);

struct Args {
    fork_commands: Vec<String>,
    path_history: Option<String>,
    pending_commands: Vec<PendingCommand>,
    paths: Vec<String>,
}

fn parse_args(argv: &[String]) -> Args {
    let mut fork_commands = Vec::new();
    let mut path_history = None;
    let mut pending_commands = Vec::new();
    let mut paths = Vec::new();

    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "--fork-command" => {
                if let Some(value) = argv.get(i + 1) {
                    fork_commands.push(value.clone());
                    i += 1;
                }
            }
            "--path-history" => {
                if let Some(value) = argv.get(i + 1) {
                    path_history = Some(value.clone());
                    i += 1;
                }
            }
            arg if arg.starts_with('+') => pending_commands.push(PendingCommand(arg[1..].to_string())),
            arg => paths.push(arg.to_string()),
        }
        i += 1;
    }

    Args { fork_commands, path_history, pending_commands, paths }
}

fn main() {
    env_logger::init();
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv);

    let mut editor = Editor::new();
    editor.bind_root(&[Key::Ctrl(b's')], Rc::new(SaveCommand));
    editor.bind_root(&[Key::Ctrl(b'q')], Rc::new(QuitCommand));

    for path in &args.paths {
        match Buffer::from_file(path.clone(), path) {
            Ok(buffer) => {
                log::info!("opened buffer '{path}'");
                editor.insert_buffer(buffer);
                editor.set_current_buffer(path);
            }
            Err(err) => {
                log::error!("failed to open '{path}': {err}");
            }
        }
    }

    for command in &args.pending_commands {
        log::info!("pending command recorded for scripting layer: {}", command.0);
    }
    for command in &args.fork_commands {
        log::info!("fork-command recorded: {command}");
    }
    if let Some(path_history) = &args.path_history {
        log::info!("path history file: {path_history}");
    }

    editor.process_input(Key::Ctrl(b'q'));

    for line in editor.current_buffer().contents.lines() {
        println!("{}", line.as_str());
    }

    std::process::exit(editor.exit_value.unwrap_or(0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_trailing_paths() {
        let argv: Vec<String> = ["--fork-command", "ls", "--path-history", "hist.txt", "+buffer.save()", "a.txt", "b.txt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let args = parse_args(&argv);
        assert_eq!(args.fork_commands, vec!["ls".to_string()]);
        assert_eq!(args.path_history, Some("hist.txt".to_string()));
        assert_eq!(args.pending_commands.len(), 1);
        assert_eq!(args.pending_commands[0].0, "buffer.save()");
        assert_eq!(args.paths, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }
}
