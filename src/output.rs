//! User-facing console output: colored one-line messages plus rendering of
//! previews, plans and batch/undo reports. Colors are enabled only when
//! stdout is a TTY.

use owo_colors::OwoColorize;

use crate::fs_ops::{BatchReport, FileEntry, ItemOutcome, PlannedMove, UndoOutcome, UndoReport};

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

/// Print a plain line (no prefix). Used for listings users may script against.
pub fn print_user(msg: &str) {
    println!("{msg}");
}

/// Numbered listing, 1-based so the numbers can be fed back to `--select`.
pub fn format_preview(entries: &[FileEntry]) -> Vec<String> {
    let width = entries.len().to_string().len();
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{:>width$}. {}", i + 1, e.relative_path))
        .collect()
}

pub fn print_preview(entries: &[FileEntry]) {
    if entries.is_empty() {
        print_info("No image files found.");
        return;
    }
    for line in format_preview(entries) {
        print_user(&line);
    }
    print_info(&format!("{} image file(s)", entries.len()));
}

pub fn print_plan(plan: &[PlannedMove]) {
    if plan.is_empty() {
        print_info("Nothing to move.");
        return;
    }
    for p in plan {
        print_user(&format!("{} -> {}", p.relative_path, p.final_name));
    }
    print_info(&format!("dry run: {} file(s) would be moved", plan.len()));
}

/// One-line summary of a batch, e.g. "Moved 4 of 5 file(s); 1 failed".
pub fn batch_summary(report: &BatchReport) -> String {
    let mut msg = format!("Moved {} of {} file(s)", report.moved_count(), report.items.len());
    if report.failed_count() > 0 {
        msg.push_str(&format!("; {} failed", report.failed_count()));
    }
    if report.dangling_count() > 0 {
        msg.push_str(&format!("; {} copied but not removed", report.dangling_count()));
    }
    if report.was_interrupted() {
        msg.push_str(&format!("; {} skipped after interrupt", report.interrupted_count()));
    }
    msg
}

pub fn report_batch(report: &BatchReport) {
    for item in &report.items {
        match &item.outcome {
            ItemOutcome::Moved { final_name } => {
                print_user(&format!("{} -> {}", item.relative_path, final_name));
            }
            ItemOutcome::Failed(e) => print_error(&e.to_string()),
            ItemOutcome::Dangling(e) => print_warn(&e.to_string()),
            ItemOutcome::Interrupted => {}
        }
    }
    let summary = batch_summary(report);
    if report.moved_count() == report.items.len() {
        print_success(&summary);
    } else {
        print_warn(&summary);
    }
}

pub fn report_undo(report: &UndoReport) {
    if report.items.is_empty() {
        print_info("Nothing to undo.");
        return;
    }
    for item in &report.items {
        match &item.outcome {
            UndoOutcome::Restored { restored_name } => {
                print_user(&format!("{} -> {}", item.final_name, restored_name));
            }
            UndoOutcome::Failed(e) => print_error(&e.to_string()),
        }
    }
    let summary = format!("Restored {} of {} file(s)", report.restored_count(), report.items.len());
    if report.failed_count() == 0 {
        print_success(&summary);
    } else {
        print_warn(&summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RelocateError;
    use crate::fs_ops::{ItemReport, index};
    use crate::handle::MemoryFs;

    #[test]
    fn preview_lines_are_numbered_from_one() {
        let fs = MemoryFs::new();
        for i in 0..10 {
            fs.write(&format!("src/{i:02}.png"), b"");
        }
        let entries = index(&fs.dir("src").unwrap(), false, &|_| true).unwrap();
        let lines = format_preview(&entries);
        assert_eq!(lines[0], " 1. 00.png");
        assert_eq!(lines[9], "10. 09.png");
    }

    #[test]
    fn summary_mentions_each_kind_of_problem() {
        let report = BatchReport {
            items: vec![
                ItemReport {
                    relative_path: "a.png".into(),
                    outcome: ItemOutcome::Moved { final_name: "a.png".into() },
                },
                ItemReport {
                    relative_path: "b.png".into(),
                    outcome: ItemOutcome::Failed(RelocateError::Interrupted),
                },
                ItemReport {
                    relative_path: "c.png".into(),
                    outcome: ItemOutcome::Interrupted,
                },
            ],
        };
        assert_eq!(
            batch_summary(&report),
            "Moved 1 of 3 file(s); 1 failed; 1 skipped after interrupt"
        );
    }
}
