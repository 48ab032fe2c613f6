//! Core library for `img_relocate`.
//!
//! Moves image files from a source directory into a destination directory
//! without ever losing data: each file is read, written under a collision-free
//! name, committed, and only then removed from the source. The most recent
//! batch can be undone.
//!
//! The relocation core ([`fs_ops`], [`session`]) works on capability handles
//! ([`handle`]); paths only appear at the edges (config, CLI).

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod handle;
pub mod output;
pub mod platform;
pub mod session;
pub mod shell;
pub mod shutdown;

pub use config::{
    CONFIG_ENV, Config, LoadResult, LogLevel, ValidatedDirs, default_config_path, default_log_path,
    load_config_from_xml_path, load_or_init, path_has_symlink_ancestor,
};
pub use errors::{Phase, RelocateError};
pub use fs_ops::{
    BatchReport, ExtensionMatcher, FileEntry, ItemOutcome, PlannedMove, RelocationRecord, UndoLedger, UndoReport,
    index, plan_many, relocate_many, relocate_one, resolve_unique_name, undo_last_batch,
};
pub use handle::{DirHandle, DurabilityMode, FileHandle, LocalDir, entry_for_path};
#[cfg(any(test, feature = "test-helpers"))]
pub use handle::MemoryFs;
pub use session::RelocationSession;
pub use shutdown::StopFlag;
