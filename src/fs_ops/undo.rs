//! Undo ledger for the most recent batch.
//!
//! The ledger only ever holds the records of one batch: `relocate_many`
//! resets it, and `undo_last_batch` drains it whether or not every restore
//! succeeded. Nothing is persisted.

use tracing::{info, warn};

use super::duplicate::SuffixStyle;
use super::relocate::{RelocationRecord, transfer};
use crate::errors::{Phase, RelocateError};

#[derive(Debug, Default)]
pub struct UndoLedger {
    records: Vec<RelocationRecord>,
}

impl UndoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; called at the start of each batch.
    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn push(&mut self, record: RelocationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in completion order.
    pub fn records(&self) -> &[RelocationRecord] {
        &self.records
    }

    /// Drain the ledger, leaving it empty.
    pub fn take(&mut self) -> Vec<RelocationRecord> {
        std::mem::take(&mut self.records)
    }
}

#[derive(Debug)]
pub enum UndoOutcome {
    Restored { restored_name: String },
    Failed(RelocateError),
}

#[derive(Debug)]
pub struct UndoItem {
    /// Name the file had in the destination.
    pub final_name: String,
    pub original_name: String,
    pub outcome: UndoOutcome,
}

/// Per-record results of [`undo_last_batch`], in processing (reverse) order.
#[derive(Debug, Default)]
pub struct UndoReport {
    pub items: Vec<UndoItem>,
}

impl UndoReport {
    pub fn restored_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, UndoOutcome::Restored { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.len() - self.restored_count()
    }
}

fn restore_one(record: &RelocationRecord) -> Result<String, RelocateError> {
    let file = record
        .dest_parent
        .open_file(&record.final_name)
        .map_err(RelocateError::at(Phase::Read, &record.final_name))?;
    transfer(
        &file,
        &record.dest_parent,
        &record.final_name,
        &record.source_parent,
        &record.original_name,
        SuffixStyle::Restore,
    )
}

/// Move every file of the last batch back where it came from, newest first.
///
/// The original name is reused when free, else `base_restored_N.ext`.
/// Failures are reported per record; the ledger is emptied regardless.
pub fn undo_last_batch(ledger: &mut UndoLedger) -> UndoReport {
    let records = ledger.take();
    let mut report = UndoReport::default();

    for record in records.iter().rev() {
        let outcome = match restore_one(record) {
            Ok(restored_name) => {
                info!(src = %record.final_name, dest = %restored_name, "restored file");
                UndoOutcome::Restored { restored_name }
            }
            Err(e) => {
                warn!(file = %record.final_name, code = e.code(), error = %e, "restore failed");
                UndoOutcome::Failed(e)
            }
        };
        report.items.push(UndoItem {
            final_name: record.final_name.clone(),
            original_name: record.original_name.clone(),
            outcome,
        });
    }

    if !records.is_empty() {
        info!(restored = report.restored_count(), failed = report.failed_count(), "undo finished");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::index::index;
    use crate::fs_ops::relocate::relocate_many;
    use crate::handle::MemoryFs;
    use crate::shutdown::StopFlag;

    #[test]
    fn empty_ledger_is_a_no_op() {
        let mut ledger = UndoLedger::new();
        let report = undo_last_batch(&mut ledger);
        assert_eq!(report.restored_count(), 0);
        assert!(report.items.is_empty());
    }

    #[test]
    fn undo_restores_in_reverse_and_clears_ledger() {
        let fs = MemoryFs::new();
        fs.write("src/a.png", b"A");
        fs.write("src/b.png", b"B");
        let dst = fs.create_dir("dst");
        let entries = index(&fs.dir("src").unwrap(), false, &|_| true).unwrap();
        let mut ledger = UndoLedger::new();
        relocate_many(&entries, &dst, &mut ledger, &StopFlag::new());
        assert_eq!(ledger.len(), 2);

        let report = undo_last_batch(&mut ledger);
        assert_eq!(report.restored_count(), 2);
        let order: Vec<_> = report.items.iter().map(|i| i.original_name.as_str()).collect();
        assert_eq!(order, ["b.png", "a.png"]);
        assert!(ledger.is_empty());
        assert_eq!(fs.read("src/a.png").unwrap(), b"A");
        assert!(fs.file_names("dst").is_empty());
    }

    #[test]
    fn failed_restore_is_reported_and_ledger_still_cleared() {
        let fs = MemoryFs::new();
        fs.write("src/a.png", b"A");
        let dst = fs.create_dir("dst");
        let entries = index(&fs.dir("src").unwrap(), false, &|_| true).unwrap();
        let mut ledger = UndoLedger::new();
        relocate_many(&entries, &dst, &mut ledger, &StopFlag::new());

        fs.fail_reads("dst/a.png");
        let report = undo_last_batch(&mut ledger);
        assert_eq!(report.restored_count(), 0);
        assert_eq!(report.failed_count(), 1);
        assert!(ledger.is_empty());
        assert!(fs.exists("dst/a.png"));
    }

    fn moved_batch(fs: &MemoryFs) -> UndoLedger {
        for (name, body) in [("a.png", b"A"), ("b.png", b"B"), ("c.png", b"C")] {
            fs.write(&format!("src/{name}"), body);
        }
        let dst = fs.create_dir("dst");
        let entries = index(&fs.dir("src").unwrap(), false, &|_| true).unwrap();
        let mut ledger = UndoLedger::new();
        relocate_many(&entries, &dst, &mut ledger, &StopFlag::new());
        assert_eq!(ledger.len(), 3);
        ledger
    }

    fn outcome_names(report: &UndoReport) -> Vec<(&str, bool)> {
        report
            .items
            .iter()
            .map(|i| (i.original_name.as_str(), matches!(i.outcome, UndoOutcome::Restored { .. })))
            .collect()
    }

    #[test]
    fn unreadable_middle_record_does_not_stop_the_others() {
        let fs = MemoryFs::new();
        let mut ledger = moved_batch(&fs);

        fs.fail_reads("dst/b.png");
        let report = undo_last_batch(&mut ledger);

        assert_eq!(outcome_names(&report), [("c.png", true), ("b.png", false), ("a.png", true)]);
        assert_eq!(report.restored_count(), 2);
        assert_eq!(report.failed_count(), 1);
        match &report.items[1].outcome {
            UndoOutcome::Failed(e) => assert_eq!(e.phase(), Some(Phase::Read)),
            other => panic!("expected read failure, got {other:?}"),
        }
        assert!(ledger.is_empty());
        assert_eq!(fs.file_names("src"), ["a.png", "c.png"]);
        assert_eq!(fs.file_names("dst"), ["b.png"]);
        assert_eq!(fs.read("dst/b.png").unwrap(), b"B");
    }

    #[test]
    fn undeletable_middle_record_is_reported_and_others_restored() {
        let fs = MemoryFs::new();
        let mut ledger = moved_batch(&fs);

        fs.fail_removes("dst/b.png");
        let report = undo_last_batch(&mut ledger);

        assert_eq!(outcome_names(&report), [("c.png", true), ("b.png", false), ("a.png", true)]);
        match &report.items[1].outcome {
            UndoOutcome::Failed(e) => {
                assert!(matches!(e, RelocateError::DanglingDuplicate { .. }));
                assert_eq!(e.phase(), Some(Phase::Delete));
            }
            other => panic!("expected dangling duplicate, got {other:?}"),
        }
        assert!(ledger.is_empty());
        // The restored copy was committed before the delete failed, so both exist.
        assert_eq!(fs.file_names("src"), ["a.png", "b.png", "c.png"]);
        assert_eq!(fs.file_names("dst"), ["b.png"]);
    }

    #[test]
    fn write_failure_during_restore_keeps_destination_copy() {
        let fs = MemoryFs::new();
        let mut ledger = moved_batch(&fs);

        fs.fail_writes_in("src");
        let report = undo_last_batch(&mut ledger);

        assert_eq!(report.restored_count(), 0);
        assert_eq!(report.failed_count(), 3);
        assert!(report.items.iter().all(|i| match &i.outcome {
            UndoOutcome::Failed(e) => e.phase() == Some(Phase::Write),
            UndoOutcome::Restored { .. } => false,
        }));
        assert!(ledger.is_empty());
        assert!(fs.file_names("src").is_empty());
        assert_eq!(fs.file_names("dst"), ["a.png", "b.png", "c.png"]);
    }
}
