//! Relocation session: the state a front end keeps between user actions.
//!
//! Holds the chosen source and destination handles, the recursive flag, the
//! current preview listing, manually picked files and the undo ledger of the
//! most recent batch. Precondition errors are returned before anything on
//! storage is touched.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::errors::RelocateError;
use crate::fs_ops::{
    BatchReport, ExtensionMatcher, FileEntry, PlannedMove, UndoLedger, UndoReport, index, plan_many,
    relocate_many, undo_last_batch,
};
use crate::handle::DirHandle;
use crate::shutdown::StopFlag;

#[derive(Debug)]
pub struct RelocationSession {
    source: Option<DirHandle>,
    dest: Option<DirHandle>,
    recursive: bool,
    matcher: ExtensionMatcher,
    preview: Vec<FileEntry>,
    picks: Vec<FileEntry>,
    ledger: UndoLedger,
    stop: StopFlag,
}

impl Default for RelocationSession {
    fn default() -> Self {
        Self {
            source: None,
            dest: None,
            recursive: true,
            matcher: ExtensionMatcher::images(),
            preview: Vec::new(),
            picks: Vec::new(),
            ledger: UndoLedger::new(),
            stop: StopFlag::new(),
        }
    }
}

impl RelocationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the source directory; the old preview no longer applies.
    pub fn set_source(&mut self, dir: DirHandle) {
        self.source = Some(dir);
        self.preview.clear();
    }

    pub fn set_destination(&mut self, dir: DirHandle) {
        self.dest = Some(dir);
    }

    pub fn set_recursive(&mut self, recursive: bool) {
        self.recursive = recursive;
    }

    pub fn set_matcher(&mut self, matcher: ExtensionMatcher) {
        self.matcher = matcher;
    }

    /// Use `stop` for cancellation of subsequent batches.
    pub fn set_stop_flag(&mut self, stop: StopFlag) {
        self.stop = stop;
    }

    pub fn source(&self) -> Option<&DirHandle> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&DirHandle> {
        self.dest.as_ref()
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn matcher(&self) -> &ExtensionMatcher {
        &self.matcher
    }

    pub fn preview(&self) -> &[FileEntry] {
        &self.preview
    }

    pub fn picks(&self) -> &[FileEntry] {
        &self.picks
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.ledger.is_empty()
    }

    /// Re-list the source into the preview. On failure the preview is left empty.
    pub fn index(&mut self) -> Result<&[FileEntry], RelocateError> {
        let source = self.source.as_ref().ok_or(RelocateError::NoSourceSelected)?;
        let matcher = &self.matcher;
        match index(source, self.recursive, &|name| matcher.matches(name)) {
            Ok(entries) => self.preview = entries,
            Err(e) => {
                self.preview.clear();
                return Err(e);
            }
        }
        Ok(&self.preview)
    }

    /// Re-index the source and move everything it contains.
    pub fn relocate_all(&mut self) -> Result<BatchReport, RelocateError> {
        if self.source.is_none() {
            return Err(RelocateError::NoSourceSelected);
        }
        let dest = self.checked_destination(&[])?;
        self.index()?;
        let entries = self.movable_preview(&dest);
        if entries.is_empty() {
            debug!("nothing to relocate");
            return Ok(BatchReport::default());
        }
        self.run_batch(&entries)
    }

    /// Move the preview entries at `indices` (0-based, duplicates ignored).
    pub fn relocate_selected(&mut self, indices: &[usize]) -> Result<BatchReport, RelocateError> {
        self.checked_destination(&[])?;
        let entries = self.selection(indices)?;
        self.run_batch(&entries)
    }

    /// Move an explicit list of entries.
    pub fn relocate_entries(&mut self, entries: &[FileEntry]) -> Result<BatchReport, RelocateError> {
        if entries.is_empty() {
            return Err(RelocateError::EmptySelection);
        }
        self.run_batch(entries)
    }

    /// Add individually chosen files; entries already picked are ignored.
    /// Returns how many were added.
    pub fn pick(&mut self, entries: impl IntoIterator<Item = FileEntry>) -> usize {
        let mut added = 0;
        for entry in entries {
            let dup = self
                .picks
                .iter()
                .any(|p| p.parent == entry.parent && p.name == entry.name);
            if !dup {
                self.picks.push(entry);
                added += 1;
            }
        }
        added
    }

    /// Move the picked files, then forget them.
    pub fn relocate_picks(&mut self) -> Result<BatchReport, RelocateError> {
        if self.picks.is_empty() {
            return Err(RelocateError::EmptySelection);
        }
        let picks = self.picks.clone();
        let report = self.run_batch(&picks)?;
        self.picks.clear();
        Ok(report)
    }

    pub fn clear_picks(&mut self) {
        self.picks.clear();
    }

    /// Dry run of [`RelocationSession::relocate_all`]: re-indexes, then predicts names.
    pub fn plan_all(&mut self) -> Result<Vec<PlannedMove>, RelocateError> {
        if self.source.is_none() {
            return Err(RelocateError::NoSourceSelected);
        }
        let dest = self.checked_destination(&[])?;
        self.index()?;
        plan_many(&self.movable_preview(&dest), &dest)
    }

    /// Dry run of [`RelocationSession::relocate_picks`].
    pub fn plan_picks(&self) -> Result<Vec<PlannedMove>, RelocateError> {
        if self.picks.is_empty() {
            return Err(RelocateError::EmptySelection);
        }
        let dest = self.checked_destination(&self.picks)?;
        plan_many(&self.picks, &dest)
    }

    /// Dry run of [`RelocationSession::relocate_selected`].
    pub fn plan_selected(&self, indices: &[usize]) -> Result<Vec<PlannedMove>, RelocateError> {
        self.checked_destination(&[])?;
        let entries = self.selection(indices)?;
        let dest = self.checked_destination(&entries)?;
        plan_many(&entries, &dest)
    }

    /// Reverse the most recent batch.
    pub fn undo_last_batch(&mut self) -> UndoReport {
        let report = undo_last_batch(&mut self.ledger);
        if !report.items.is_empty() {
            self.refresh_preview();
        }
        report
    }

    fn selection(&self, indices: &[usize]) -> Result<Vec<FileEntry>, RelocateError> {
        if indices.is_empty() {
            return Err(RelocateError::EmptySelection);
        }
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(indices.len());
        for &i in indices {
            let entry = self.preview.get(i).ok_or(RelocateError::InvalidSelection {
                index: i,
                len: self.preview.len(),
            })?;
            if seen.insert(i) {
                out.push(entry.clone());
            }
        }
        Ok(out)
    }

    /// Preview entries not already sitting in `dest`. Only non-empty when the
    /// destination is nested inside a recursively indexed source.
    fn movable_preview(&self, dest: &DirHandle) -> Vec<FileEntry> {
        let entries: Vec<FileEntry> = self.preview.iter().filter(|e| e.parent != *dest).cloned().collect();
        let skipped = self.preview.len() - entries.len();
        if skipped > 0 {
            debug!(skipped, "leaving files already in the destination");
        }
        entries
    }

    /// Destination handle, refusing one that is the source or holds any of `entries`.
    fn checked_destination(&self, entries: &[FileEntry]) -> Result<DirHandle, RelocateError> {
        let dest = self.dest.clone().ok_or(RelocateError::NoDestinationSelected)?;
        if self.source.as_ref() == Some(&dest) || entries.iter().any(|e| e.parent == dest) {
            return Err(RelocateError::SameDirectory);
        }
        Ok(dest)
    }

    fn run_batch(&mut self, entries: &[FileEntry]) -> Result<BatchReport, RelocateError> {
        let dest = self.checked_destination(entries)?;
        let report = relocate_many(entries, &dest, &mut self.ledger, &self.stop);
        self.refresh_preview();
        Ok(report)
    }

    /// Keep the preview in step with storage after files moved.
    fn refresh_preview(&mut self) {
        if self.source.is_none() {
            return;
        }
        if let Err(e) = self.index() {
            warn!(code = e.code(), error = %e, "could not refresh preview");
        }
    }
}
