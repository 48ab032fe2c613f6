//! Local filesystem backend.
//!
//! A `LocalDir` is scoped to one directory: child names are validated so no
//! operation can reach outside it. Symlinks and special files are invisible to
//! `entries` and cannot be opened as files or directories.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::durable::{DurabilityMode, write_committed};
use super::hints::with_hint;
use super::{DirHandle, Directory, Entry, EntryKind, FileHandle, FileObject, ResourceId};
use crate::fs_ops::FileEntry;
use crate::platform::resource_id;

#[derive(Debug)]
pub struct LocalDir {
    path: PathBuf,
    name: String,
    id: ResourceId,
    durability: DurabilityMode,
}

impl LocalDir {
    /// Open a directory handle with full durability.
    pub fn open(path: impl AsRef<Path>) -> io::Result<DirHandle> {
        Self::open_with(path, DurabilityMode::Full)
    }

    /// Open a directory handle; files reached through it commit writes with `durability`.
    pub fn open_with(path: impl AsRef<Path>, durability: DurabilityMode) -> io::Result<DirHandle> {
        Ok(DirHandle::new(Self::new(path.as_ref(), durability)?))
    }

    fn new(path: &Path, durability: DurabilityMode) -> io::Result<Self> {
        let meta = fs::metadata(path).map_err(with_hint("open directory", path))?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: '{}'", path.display()),
            ));
        }
        let id = resource_id(path).map_err(with_hint("identify directory", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path: path.to_path_buf(),
            name,
            id,
            durability,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a child name, refusing anything that is not a single plain component.
    fn child(&self, name: &str) -> io::Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
            && !name.contains('\0');
        if !plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{name}' is not a plain file name inside '{}'", self.path.display()),
            ));
        }
        Ok(self.path.join(name))
    }

    fn file_handle(&self, name: &str, path: PathBuf) -> FileHandle {
        FileHandle::new(LocalFile {
            path,
            name: name.to_string(),
            durability: self.durability,
        })
    }
}

impl Directory for LocalDir {
    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> io::Result<Vec<Entry>> {
        let mut out = Vec::new();
        for item in WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let item = item.map_err(io::Error::from).map_err(with_hint("list directory", &self.path))?;
            let ft = item.file_type();
            let kind = if ft.is_file() {
                EntryKind::File
            } else if ft.is_dir() {
                EntryKind::Directory
            } else {
                trace!(path = %item.path().display(), "skipping non-regular entry");
                continue;
            };
            match item.file_name().to_str() {
                Some(name) => out.push(Entry {
                    name: name.to_string(),
                    kind,
                }),
                None => debug!(path = %item.path().display(), "skipping entry with non-UTF-8 name"),
            }
        }
        Ok(out)
    }

    fn open_dir(&self, name: &str) -> io::Result<DirHandle> {
        let path = self.child(name)?;
        let meta = fs::symlink_metadata(&path).map_err(with_hint("open directory", &path))?;
        if !meta.file_type().is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: '{}'", path.display()),
            ));
        }
        Ok(DirHandle::new(Self::new(&path, self.durability)?))
    }

    fn open_file(&self, name: &str) -> io::Result<FileHandle> {
        let path = self.child(name)?;
        let meta = fs::symlink_metadata(&path).map_err(with_hint("open file", &path))?;
        if !meta.file_type().is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: '{}'", path.display()),
            ));
        }
        Ok(self.file_handle(name, path))
    }

    fn contains(&self, name: &str) -> io::Result<bool> {
        let path = self.child(name)?;
        match fs::symlink_metadata(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(with_hint("probe", &path)(e)),
        }
    }

    fn create_file(&self, name: &str) -> io::Result<FileHandle> {
        let path = self.child(name)?;
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(with_hint("create file", &path))?;
        Ok(self.file_handle(name, path))
    }

    fn remove_entry(&self, name: &str) -> io::Result<()> {
        let path = self.child(name)?;
        let meta = fs::symlink_metadata(&path).map_err(with_hint("remove", &path))?;
        if meta.file_type().is_dir() {
            fs::remove_dir(&path).map_err(with_hint("remove directory", &path))
        } else {
            fs::remove_file(&path).map_err(with_hint("remove file", &path))
        }
    }
}

#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    durability: DurabilityMode,
}

impl FileObject for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path).map_err(with_hint("read file", &self.path))
    }

    fn write_committed(&self, contents: &[u8]) -> io::Result<()> {
        let res = write_committed(&self.path, contents, self.durability)
            .map_err(with_hint("write file", &self.path))?;
        trace!(path = %self.path.display(), bytes = res.bytes, mode = %res.mode, "write committed");
        Ok(())
    }
}

/// Build a `FileEntry` for a file chosen by path (manual picks from the command line).
pub fn entry_for_path(path: &Path, durability: DurabilityMode) -> io::Result<FileEntry> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no usable file name in '{}'", path.display()),
            )
        })?
        .to_string();
    let parent_path = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let parent = LocalDir::open_with(&parent_path, durability)?;
    let file = parent.open_file(&name)?;
    Ok(FileEntry {
        relative_path: name.clone(),
        name,
        file,
        parent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn child_names_cannot_escape() {
        let dir = assert_fs::TempDir::new().unwrap();
        let handle = LocalDir::open(dir.path()).unwrap();
        for bad in ["", ".", "..", "../x.png", "a/b.png"] {
            let err = handle.contains(bad).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "name {bad:?}");
        }
    }

    #[test]
    fn entries_are_sorted_and_classified() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("b.png").touch().unwrap();
        dir.child("a.jpg").touch().unwrap();
        dir.child("sub").create_dir_all().unwrap();
        let handle = LocalDir::open(dir.path()).unwrap();
        let entries = handle.entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.png", "sub"]);
        assert_eq!(entries[2].kind, EntryKind::Directory);
    }

    #[test]
    fn create_file_is_exclusive() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("taken.png").write_str("keep").unwrap();
        let handle = LocalDir::open(dir.path()).unwrap();
        let err = handle.create_file("taken.png").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        dir.child("taken.png").assert("keep");
    }

    #[test]
    fn same_directory_opened_twice_is_equal() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("sub").create_dir_all().unwrap();
        let a = LocalDir::open(dir.path()).unwrap();
        let b = LocalDir::open(dir.path().join("sub").join("..")).unwrap();
        let sub = a.open_dir("sub").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, sub);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_listed() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("real.png").touch().unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.png"), dir.path().join("link.png")).unwrap();
        let handle = LocalDir::open(dir.path()).unwrap();
        let names: Vec<_> = handle.entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["real.png"]);
        assert!(handle.open_file("link.png").is_err());
    }
}
