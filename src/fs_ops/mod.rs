//! Relocation core: indexing, collision-free naming, copy-verify-delete and undo.
//!
//! Everything here works on capability handles from [`crate::handle`]; no
//! function in this module takes a raw path.

pub mod duplicate;
pub mod index;
pub mod relocate;
pub mod undo;

pub use duplicate::{preview_unique_name, resolve_restore_name, resolve_unique_name, split_name};
pub use index::{ExtensionMatcher, FileEntry, IMAGE_EXTENSIONS, index};
pub use relocate::{BatchReport, ItemOutcome, ItemReport, PlannedMove, RelocationRecord, plan_many, relocate_many, relocate_one};
pub use undo::{UndoItem, UndoLedger, UndoOutcome, UndoReport, undo_last_batch};
