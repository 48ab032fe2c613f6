//! Copy-verify-delete relocation of single files and batches.
//!
//! Steps for one file: read the full contents, create a collision-free
//! destination file, write and commit, then delete the original. The original
//! is only touched after the commit succeeded, so no step can lose data.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::duplicate::{SuffixStyle, preview_unique_name, resolve_restore_name, resolve_unique_name};
use super::index::FileEntry;
use super::undo::UndoLedger;
use crate::errors::{Phase, RelocateError};
use crate::handle::{DirHandle, FileHandle};
use crate::shutdown::StopFlag;

/// Everything needed to reverse one completed relocation.
#[derive(Debug, Clone)]
pub struct RelocationRecord {
    pub source_parent: DirHandle,
    pub original_name: String,
    pub dest_parent: DirHandle,
    pub final_name: String,
}

/// Result for one entry of a batch.
#[derive(Debug)]
pub enum ItemOutcome {
    Moved { final_name: String },
    /// Nothing changed for this file.
    Failed(RelocateError),
    /// The copy was committed but the original is still in place.
    Dangling(RelocateError),
    /// Not started because a stop was requested.
    Interrupted,
}

#[derive(Debug)]
pub struct ItemReport {
    pub relative_path: String,
    pub outcome: ItemOutcome,
}

/// Per-item results of [`relocate_many`], in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn moved_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Moved { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed(_)))
    }

    pub fn dangling_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Dangling(_)))
    }

    pub fn interrupted_count(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Interrupted))
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted_count() > 0
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}

/// Predicted outcome of relocating one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub relative_path: String,
    pub final_name: String,
}

/// Move `file` (named `name` inside `from`) into `to` under `desired` or its
/// first free variant; returns the name it received.
pub(crate) fn transfer(
    file: &FileHandle,
    from: &DirHandle,
    name: &str,
    to: &DirHandle,
    desired: &str,
    style: SuffixStyle,
) -> Result<String, RelocateError> {
    let contents = file.read_all().map_err(RelocateError::at(Phase::Read, name))?;

    let resolved = match style {
        SuffixStyle::Move => resolve_unique_name(to, desired),
        SuffixStyle::Restore => resolve_restore_name(to, desired),
    };
    let (target, final_name) = resolved.map_err(RelocateError::at(Phase::Write, name))?;

    if let Err(e) = target.write_committed(&contents) {
        // Drop the empty or partial file we created; the source is untouched.
        if let Err(cleanup) = to.remove_entry(&final_name) {
            warn!(file = %final_name, error = %cleanup, "could not remove incomplete destination file");
        }
        return Err(RelocateError::at(Phase::Write, name)(e));
    }

    if let Err(source) = from.remove_entry(name) {
        return Err(RelocateError::DanglingDuplicate {
            name: name.to_string(),
            final_name,
            source,
        });
    }

    debug!(name, final_name = %final_name, bytes = contents.len(), "transfer complete");
    Ok(final_name)
}

/// Relocate one entry into `dest`.
pub fn relocate_one(entry: &FileEntry, dest: &DirHandle) -> Result<RelocationRecord, RelocateError> {
    let final_name = transfer(
        &entry.file,
        &entry.parent,
        &entry.name,
        dest,
        &entry.name,
        SuffixStyle::Move,
    )?;
    info!(src = %entry.relative_path, dest = %final_name, "moved file");
    Ok(RelocationRecord {
        source_parent: entry.parent.clone(),
        original_name: entry.name.clone(),
        dest_parent: dest.clone(),
        final_name,
    })
}

/// Relocate `entries` in order. Never fails as a whole: per-item errors are
/// recorded in the report and the loop moves on.
///
/// The ledger is reset first and receives one record per fully successful item.
/// `stop` is checked before each item; a started item always runs to completion.
pub fn relocate_many(entries: &[FileEntry], dest: &DirHandle, ledger: &mut UndoLedger, stop: &StopFlag) -> BatchReport {
    ledger.reset();
    let mut report = BatchReport::default();

    for entry in entries {
        let outcome = if stop.is_requested() {
            ItemOutcome::Interrupted
        } else {
            match relocate_one(entry, dest) {
                Ok(record) => {
                    let final_name = record.final_name.clone();
                    ledger.push(record);
                    ItemOutcome::Moved { final_name }
                }
                Err(e @ RelocateError::DanglingDuplicate { .. }) => {
                    warn!(file = %entry.relative_path, code = e.code(), error = %e, "original left in place after copy");
                    ItemOutcome::Dangling(e)
                }
                Err(e) => {
                    warn!(
                        file = %entry.relative_path,
                        code = e.code(),
                        phase = ?e.phase(),
                        error = %e,
                        "relocation failed"
                    );
                    ItemOutcome::Failed(e)
                }
            }
        };
        report.items.push(ItemReport {
            relative_path: entry.relative_path.clone(),
            outcome,
        });
    }

    if report.was_interrupted() {
        warn!(skipped = report.interrupted_count(), "batch interrupted before completion");
    }
    info!(
        moved = report.moved_count(),
        failed = report.failed_count(),
        dangling = report.dangling_count(),
        "batch finished"
    );
    report
}

/// Dry run: the name each entry would receive in `dest`, in order.
/// Only existence probes touch storage.
pub fn plan_many(entries: &[FileEntry], dest: &DirHandle) -> Result<Vec<PlannedMove>, RelocateError> {
    let mut reserved = HashSet::new();
    let mut plan = Vec::with_capacity(entries.len());
    for entry in entries {
        let final_name = preview_unique_name(dest, &entry.name, &reserved).map_err(|source| {
            RelocateError::DirectoryAccess {
                dir: dest.name().to_string(),
                source,
            }
        })?;
        reserved.insert(final_name.clone());
        plan.push(PlannedMove {
            relative_path: entry.relative_path.clone(),
            final_name,
        });
    }
    Ok(plan)
}
