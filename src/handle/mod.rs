//! Capability handles over the host storage.
//!
//! The relocation engine never sees raw paths: it works with directory and
//! file handles obtained from a backend. Two backends ship with the crate:
//! - [`local`]: the real filesystem (std + walkdir), used by the CLI.
//! - `memory`: an in-memory tree with fault injection, compiled for tests
//!   and behind the `test-helpers` feature.
//!
//! Handle equality is resource identity ([`ResourceId`]), not name or path.

pub mod durable;
pub mod hints;
pub mod local;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;

use std::fmt;
use std::io;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

pub use durable::DurabilityMode;
pub use local::{LocalDir, entry_for_path};
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemoryFs;

/// Identity of the storage object behind a handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// Device + inode (Unix).
    Inode { dev: u64, ino: u64 },
    /// Canonical path, for platforms without stable inode numbers.
    Canonical(PathBuf),
    /// Node id inside an in-memory tree (tree id, node id).
    Memory { tree: u64, node: u64 },
}

/// What kind of object a directory entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One child reported by [`Directory::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

/// Directory capability: everything the engine may do inside one directory.
pub trait Directory: Send + Sync {
    fn id(&self) -> &ResourceId;

    /// Display name of the directory (leaf component).
    fn name(&self) -> &str;

    /// Files and subdirectories directly inside this directory.
    fn entries(&self) -> io::Result<Vec<Entry>>;

    fn open_dir(&self, name: &str) -> io::Result<DirHandle>;

    /// Handle to an existing file; `NotFound` if absent.
    fn open_file(&self, name: &str) -> io::Result<FileHandle>;

    /// Existence probe for any kind of entry.
    fn contains(&self, name: &str) -> io::Result<bool>;

    /// Create an empty file. Fails with `AlreadyExists` if the name is taken.
    fn create_file(&self, name: &str) -> io::Result<FileHandle>;

    fn remove_entry(&self, name: &str) -> io::Result<()>;
}

/// File capability.
pub trait FileObject: Send + Sync {
    fn name(&self) -> &str;

    fn read_all(&self) -> io::Result<Vec<u8>>;

    /// Replace the file contents and return only once the write is committed.
    fn write_committed(&self, contents: &[u8]) -> io::Result<()>;
}

/// Shared, cloneable directory handle.
#[derive(Clone)]
pub struct DirHandle(Arc<dyn Directory>);

impl DirHandle {
    pub fn new(dir: impl Directory + 'static) -> Self {
        Self(Arc::new(dir))
    }
}

impl Deref for DirHandle {
    type Target = dyn Directory;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for DirHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for DirHandle {}

impl fmt::Debug for DirHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirHandle")
            .field("name", &self.0.name())
            .field("id", self.0.id())
            .finish()
    }
}

/// Shared, cloneable file handle.
#[derive(Clone)]
pub struct FileHandle(Arc<dyn FileObject>);

impl FileHandle {
    pub fn new(file: impl FileObject + 'static) -> Self {
        Self(Arc::new(file))
    }
}

impl Deref for FileHandle {
    type Target = dyn FileObject;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileHandle").field(&self.0.name()).finish()
    }
}
