//! Typed error definitions for img_relocate.
//! Precondition errors abort an operation before any side effect; per-item
//! errors are captured in batch reports and never raised past the item boundary.

use std::fmt;
use std::io;
use thiserror::Error;

/// Step of a single relocation (or restoration) that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading the full contents of the file being moved.
    Read,
    /// Resolving, creating or committing the destination file.
    Write,
    /// Removing the original after a committed write.
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Read => "read",
            Phase::Write => "write",
            Phase::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("Cannot access directory '{dir}': {source}")]
    DirectoryAccess {
        dir: String,
        #[source]
        source: io::Error,
    },

    #[error("{phase} failed for '{name}': {source}")]
    Relocation {
        phase: Phase,
        name: String,
        #[source]
        source: io::Error,
    },

    /// The copy was committed but the original could not be removed; both files exist.
    #[error("'{name}' was written as '{final_name}' but the original could not be removed: {source}")]
    DanglingDuplicate {
        name: String,
        final_name: String,
        #[source]
        source: io::Error,
    },

    #[error("No source directory selected")]
    NoSourceSelected,

    #[error("No destination directory selected")]
    NoDestinationSelected,

    #[error("Source and destination are the same directory")]
    SameDirectory,

    #[error("No files selected")]
    EmptySelection,

    #[error("Selection index {index} is out of range (preview has {len} entries)")]
    InvalidSelection { index: usize, len: usize },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl RelocateError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            RelocateError::DirectoryAccess { .. } => 10,
            RelocateError::Relocation { phase: Phase::Read, .. } => 20,
            RelocateError::Relocation { phase: Phase::Write, .. } => 21,
            RelocateError::Relocation { phase: Phase::Delete, .. } => 22,
            RelocateError::DanglingDuplicate { .. } => 23,
            RelocateError::NoSourceSelected => 30,
            RelocateError::NoDestinationSelected => 31,
            RelocateError::SameDirectory => 32,
            RelocateError::EmptySelection => 33,
            RelocateError::InvalidSelection { .. } => 34,
            RelocateError::Interrupted => 130,
        }
    }

    /// Phase of a per-item failure; `None` for whole-operation errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RelocateError::Relocation { phase, .. } => Some(*phase),
            RelocateError::DanglingDuplicate { .. } => Some(Phase::Delete),
            _ => None,
        }
    }

    /// True for errors raised before any work began.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            RelocateError::NoSourceSelected
                | RelocateError::NoDestinationSelected
                | RelocateError::SameDirectory
                | RelocateError::EmptySelection
                | RelocateError::InvalidSelection { .. }
        )
    }

    pub(crate) fn at(phase: Phase, name: &str) -> impl FnOnce(io::Error) -> RelocateError + '_ {
        move |source| RelocateError::Relocation {
            phase,
            name: name.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_phase_reported_for_dangling_duplicate() {
        let err = RelocateError::DanglingDuplicate {
            name: "a.png".into(),
            final_name: "a_2.png".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.phase(), Some(Phase::Delete));
        assert!(!err.is_precondition());
        assert!(err.to_string().contains("a_2.png"));
    }

    #[test]
    fn relocation_message_names_phase() {
        let err = RelocateError::at(Phase::Read, "cat.jpg")(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code(), 20);
        assert!(err.to_string().starts_with("read failed for 'cat.jpg'"));
    }
}
