//! Interactive session on top of [`RelocationSession`].
//!
//! Undo state lives only in memory, so this line-oriented shell is how a
//! command-line user reaches it: preview, move, look at the result, undo.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::handle::DirHandle;
use crate::output as out;
use crate::session::RelocationSession;
use crate::shutdown::StopFlag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Preview,
    Recursive(bool),
    MoveAll,
    /// 0-based preview indices.
    MoveSelected(Vec<usize>),
    PlanAll,
    PlanSelected(Vec<usize>),
    Undo,
    Status,
    Help,
    Quit,
    Empty,
}

const HELP: &str = "\
commands:
  preview | ls          list image files in the source (numbered)
  recursive on|off      include subfolders when listing
  move all              move every listed file
  move N [N ...]        move the listed files with these numbers (e.g. move 1 3,5)
  plan all | plan N...  show the names files would get, without moving
  undo                  move the last batch back
  status                show directories, options and undo state
  help                  this text
  quit | exit           leave";

/// Parse 1-based numbers separated by spaces and/or commas into 0-based indices.
fn parse_indices<'a>(args: impl Iterator<Item = &'a str>) -> Result<Vec<usize>, String> {
    let mut out = Vec::new();
    for tok in args.flat_map(|a| a.split(',')).filter(|t| !t.is_empty()) {
        let n: usize = tok.parse().map_err(|_| format!("'{tok}' is not a file number"))?;
        if n == 0 {
            return Err("file numbers start at 1".to_string());
        }
        out.push(n - 1);
    }
    if out.is_empty() {
        return Err("expected 'all' or one or more file numbers".to_string());
    }
    Ok(out)
}

/// Parse one input line. Pure: no I/O.
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(ShellCommand::Empty);
    };
    let rest: Vec<&str> = words.collect();
    match head.to_ascii_lowercase().as_str() {
        "preview" | "ls" | "list" if rest.is_empty() => Ok(ShellCommand::Preview),
        "recursive" => match rest.as_slice() {
            ["on"] | ["true"] | ["yes"] => Ok(ShellCommand::Recursive(true)),
            ["off"] | ["false"] | ["no"] => Ok(ShellCommand::Recursive(false)),
            _ => Err("usage: recursive on|off".to_string()),
        },
        "move" | "mv" => match rest.as_slice() {
            ["all"] => Ok(ShellCommand::MoveAll),
            _ => parse_indices(rest.into_iter()).map(ShellCommand::MoveSelected),
        },
        "plan" => match rest.as_slice() {
            ["all"] => Ok(ShellCommand::PlanAll),
            _ => parse_indices(rest.into_iter()).map(ShellCommand::PlanSelected),
        },
        "undo" if rest.is_empty() => Ok(ShellCommand::Undo),
        "status" if rest.is_empty() => Ok(ShellCommand::Status),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

fn print_status(session: &RelocationSession) {
    let name = |d: Option<&DirHandle>| d.map_or_else(|| "<not set>".to_string(), |d| d.name().to_string());
    out::print_user(&format!("source:      {}", name(session.source())));
    out::print_user(&format!("destination: {}", name(session.destination())));
    out::print_user(&format!("recursive:   {}", if session.recursive() { "on" } else { "off" }));
    out::print_user(&format!("extensions:  {}", session.matcher()));
    out::print_user(&format!("listed:      {}", session.preview().len()));
    out::print_user(&format!("undoable:    {} file(s)", session.ledger_len()));
}

/// Run one command. Returns false when the shell should exit.
pub fn execute(session: &mut RelocationSession, stop: &StopFlag, cmd: ShellCommand, dry_run: bool) -> bool {
    // A stop request only applies to the batch that was running when it arrived.
    stop.reset();
    let result = match cmd {
        ShellCommand::Empty => Ok(()),
        ShellCommand::Quit => return false,
        ShellCommand::Help => {
            out::print_user(HELP);
            Ok(())
        }
        ShellCommand::Status => {
            print_status(session);
            Ok(())
        }
        ShellCommand::Preview => session.index().map(out::print_preview),
        ShellCommand::Recursive(on) => {
            session.set_recursive(on);
            session.index().map(out::print_preview)
        }
        ShellCommand::PlanAll => session.plan_all().map(|p| out::print_plan(&p)),
        ShellCommand::PlanSelected(ix) => session.plan_selected(&ix).map(|p| out::print_plan(&p)),
        ShellCommand::MoveAll if dry_run => session.plan_all().map(|p| out::print_plan(&p)),
        ShellCommand::MoveSelected(ix) if dry_run => session.plan_selected(&ix).map(|p| out::print_plan(&p)),
        ShellCommand::MoveAll => session.relocate_all().map(|r| out::report_batch(&r)),
        ShellCommand::MoveSelected(ix) => session.relocate_selected(&ix).map(|r| out::report_batch(&r)),
        ShellCommand::Undo => {
            out::report_undo(&session.undo_last_batch());
            Ok(())
        }
    };
    if let Err(e) = result {
        debug!(code = e.code(), "command failed");
        out::print_error(&e.to_string());
    }
    true
}

/// Read commands until `quit` or end of input.
pub fn run_shell(session: &mut RelocationSession, stop: &StopFlag, dry_run: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    out::print_info("Interactive mode. Type 'help' for commands.");
    if session.source().is_some() {
        execute(session, stop, ShellCommand::Preview, dry_run);
    }

    loop {
        match rl.readline("img_relocate> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                match parse_command(&line) {
                    Ok(cmd) => {
                        if !execute(session, stop, cmd, dry_run) {
                            break;
                        }
                    }
                    Err(msg) => out::print_warn(&msg),
                }
            }
            Err(ReadlineError::Interrupted) => out::print_info("Type 'quit' to leave."),
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::MemoryFs;

    #[test]
    fn execute_moves_then_undoes() {
        let fs = MemoryFs::new();
        fs.write("src/a.png", b"A");
        fs.write("src/b.png", b"B");
        let mut s = RelocationSession::new();
        s.set_source(fs.dir("src").unwrap());
        s.set_destination(fs.create_dir("dst"));
        let stop = StopFlag::new();

        assert!(execute(&mut s, &stop, ShellCommand::Preview, false));
        assert!(execute(&mut s, &stop, ShellCommand::MoveSelected(vec![1]), false));
        assert_eq!(fs.file_names("dst"), ["b.png"]);
        assert!(execute(&mut s, &stop, ShellCommand::Undo, false));
        assert_eq!(fs.file_names("src"), ["a.png", "b.png"]);
        assert!(!execute(&mut s, &stop, ShellCommand::Quit, false));
    }

    #[test]
    fn dry_run_move_changes_nothing() {
        let fs = MemoryFs::new();
        fs.write("src/a.png", b"A");
        let mut s = RelocationSession::new();
        s.set_source(fs.dir("src").unwrap());
        s.set_destination(fs.create_dir("dst"));
        execute(&mut s, &StopFlag::new(), ShellCommand::MoveAll, true);
        assert!(fs.exists("src/a.png"));
        assert!(fs.file_names("dst").is_empty());
    }
}
