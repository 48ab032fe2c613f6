//! Directory indexing: enumerate the image files under a root handle.
//!
//! Order is reproducible for a fixed snapshot: within each directory the
//! matching files come first (sorted by name), then each subdirectory is
//! visited in name order.

use std::fmt;
use std::io;
use tracing::debug;

use crate::errors::RelocateError;
use crate::handle::{DirHandle, EntryKind, FileHandle};

/// Extensions recognised as images when nothing else is configured.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic", "heif", "svg",
];

/// One file found by [`index`].
#[derive(Clone, Debug)]
pub struct FileEntry {
    /// Leaf name including extension.
    pub name: String,
    /// `/`-joined path from the indexed root, e.g. `sub/b.jpg`.
    pub relative_path: String,
    pub file: FileHandle,
    /// Directory the file lives in.
    pub parent: DirHandle,
}

/// Case-insensitive filter on the text after a file name's last `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMatcher {
    exts: Vec<String>,
}

impl Default for ExtensionMatcher {
    fn default() -> Self {
        Self::images()
    }
}

impl ExtensionMatcher {
    pub fn images() -> Self {
        Self {
            exts: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Build from user input; leading dots, case and blanks are ignored.
    /// An empty list falls back to [`ExtensionMatcher::images`].
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exts: Vec<String> = Vec::new();
        for item in items {
            let e = item.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if !e.is_empty() && !exts.contains(&e) {
                exts.push(e);
            }
        }
        if exts.is_empty() {
            return Self::images();
        }
        Self { exts }
    }

    /// Parse a comma-separated list such as `"jpg, .PNG,gif"`.
    pub fn parse_list(s: &str) -> Self {
        Self::from_list(s.split(','))
    }

    pub fn matches(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, ext)) => self.exts.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.exts
    }
}

impl fmt::Display for ExtensionMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.exts.join(","))
    }
}

/// List files under `root` whose names pass `matcher`.
///
/// Fails with `DirectoryAccess` if `root`, or any directory reached while
/// recursing, cannot be listed; no partial listing is returned.
pub fn index(root: &DirHandle, recursive: bool, matcher: &dyn Fn(&str) -> bool) -> Result<Vec<FileEntry>, RelocateError> {
    let mut out = Vec::new();
    walk(root, "", recursive, matcher, &mut out)?;
    debug!(root = root.name(), recursive, count = out.len(), "indexed directory");
    Ok(out)
}

fn walk(
    dir: &DirHandle,
    prefix: &str,
    recursive: bool,
    matcher: &dyn Fn(&str) -> bool,
    out: &mut Vec<FileEntry>,
) -> Result<(), RelocateError> {
    let access = |source: io::Error| RelocateError::DirectoryAccess {
        dir: if prefix.is_empty() {
            dir.name().to_string()
        } else {
            prefix.to_string()
        },
        source,
    };
    let join = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        }
    };

    let mut entries = dir.entries().map_err(access)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in entries.iter().filter(|e| e.kind == EntryKind::File) {
        if !matcher(&entry.name) {
            continue;
        }
        let file = match dir.open_file(&entry.name) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(name = %entry.name, "file vanished while indexing; skipping");
                continue;
            }
            Err(e) => return Err(access(e)),
        };
        out.push(FileEntry {
            name: entry.name.clone(),
            relative_path: join(&entry.name),
            file,
            parent: dir.clone(),
        });
    }

    if recursive {
        for entry in entries.iter().filter(|e| e.kind == EntryKind::Directory) {
            let sub = dir.open_dir(&entry.name).map_err(access)?;
            walk(&sub, &join(&entry.name), recursive, matcher, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::MemoryFs;

    fn paths(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.relative_path.as_str()).collect()
    }

    #[test]
    fn matcher_is_case_insensitive_on_last_extension() {
        let m = ExtensionMatcher::images();
        assert!(m.matches("HOLIDAY.JPG"));
        assert!(m.matches("scan.final.tiff"));
        assert!(!m.matches("notes.txt"));
        assert!(!m.matches("png"));
        assert!(!m.matches("photo.png.bak"));
    }

    #[test]
    fn custom_list_normalises_entries() {
        let m = ExtensionMatcher::parse_list(" .RAW, cr2 ,,raw");
        assert_eq!(m.extensions(), ["raw", "cr2"]);
        assert!(m.matches("x.CR2"));
        assert!(!m.matches("x.jpg"));
        assert_eq!(ExtensionMatcher::parse_list(" , "), ExtensionMatcher::images());
    }

    #[test]
    fn recursive_lists_files_before_subdirectories() {
        let fs = MemoryFs::new();
        fs.write("src/z.png", b"");
        fs.write("src/a/inner.jpg", b"");
        fs.write("src/a/deeper/x.gif", b"");
        fs.write("src/b.webp", b"");
        fs.write("src/notes.txt", b"");
        let root = fs.dir("src").unwrap();
        let m = ExtensionMatcher::images();

        let flat = index(&root, false, &|n| m.matches(n)).unwrap();
        assert_eq!(paths(&flat), ["b.webp", "z.png"]);

        let deep = index(&root, true, &|n| m.matches(n)).unwrap();
        assert_eq!(paths(&deep), ["b.webp", "z.png", "a/inner.jpg", "a/deeper/x.gif"]);
        assert_eq!(deep[3].name, "x.gif");
        assert_eq!(deep[3].parent, fs.dir("src/a/deeper").unwrap());
    }

    #[test]
    fn unreadable_root_fails_without_partial_listing() {
        let fs = MemoryFs::new();
        fs.write("src/a.png", b"");
        let root = fs.dir("src").unwrap();
        fs.revoke("src");
        let err = index(&root, false, &|_| true).unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn unreadable_subdirectory_only_matters_when_recursing() {
        let fs = MemoryFs::new();
        fs.write("src/a.png", b"");
        fs.write("src/locked/b.png", b"");
        fs.revoke("src/locked");
        let root = fs.dir("src").unwrap();
        assert_eq!(index(&root, false, &|_| true).unwrap().len(), 1);
        let err = index(&root, true, &|_| true).unwrap_err();
        assert!(matches!(err, RelocateError::DirectoryAccess { ref dir, .. } if dir == "locked"));
    }
}
