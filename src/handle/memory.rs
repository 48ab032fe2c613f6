//! In-memory backend with fault injection.
//!
//! Test helpers address nodes with `/`-separated paths relative to the tree
//! root (`""` is the root). The engine itself only ever sees handles.
//! Integration tests reach it through the `test-helpers` feature.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{DirHandle, Directory, Entry, EntryKind, FileHandle, FileObject, ResourceId};

static NEXT_TREE: AtomicU64 = AtomicU64::new(1);

const ROOT: u64 = 0;

#[derive(Debug)]
enum Child {
    File(Vec<u8>),
    Dir(u64),
}

#[derive(Debug, Default)]
struct DirNode {
    name: String,
    children: BTreeMap<String, Child>,
}

#[derive(Debug, Default)]
struct Tree {
    dirs: HashMap<u64, DirNode>,
    next_node: u64,
    fail_reads: HashSet<(u64, String)>,
    fail_removes: HashSet<(u64, String)>,
    fail_writes: HashSet<u64>,
    revoked: HashSet<u64>,
}

impl Tree {
    fn dir(&self, node: u64) -> io::Result<&DirNode> {
        if self.revoked.contains(&node) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "directory access revoked"));
        }
        self.dirs
            .get(&node)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "directory no longer exists"))
    }

    fn dir_mut(&mut self, node: u64) -> io::Result<&mut DirNode> {
        if self.revoked.contains(&node) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "directory access revoked"));
        }
        self.dirs
            .get_mut(&node)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "directory no longer exists"))
    }

    fn lookup_dir(&self, path: &str) -> Option<u64> {
        let mut node = ROOT;
        for part in components(path) {
            match self.dirs.get(&node)?.children.get(part)? {
                Child::Dir(id) => node = *id,
                Child::File(_) => return None,
            }
        }
        Some(node)
    }

    fn ensure_dir(&mut self, path: &str) -> u64 {
        let mut node = ROOT;
        for part in components(path) {
            let existing = match self.dirs.get(&node).and_then(|d| d.children.get(part)) {
                Some(Child::Dir(id)) => Some(*id),
                _ => None,
            };
            node = match existing {
                Some(id) => id,
                None => {
                    self.next_node += 1;
                    let id = self.next_node;
                    self.dirs.insert(
                        id,
                        DirNode {
                            name: part.to_string(),
                            children: BTreeMap::new(),
                        },
                    );
                    if let Some(parent) = self.dirs.get_mut(&node) {
                        parent.children.insert(part.to_string(), Child::Dir(id));
                    }
                    id
                }
            };
        }
        node
    }

    fn drop_subtree(&mut self, node: u64) {
        if let Some(dir) = self.dirs.remove(&node) {
            for child in dir.children.values() {
                if let Child::Dir(id) = child {
                    self.drop_subtree(*id);
                }
            }
        }
    }
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|p| !p.is_empty())
}

fn split_parent(path: &str) -> (&str, &str) {
    let trimmed = path.trim_matches('/');
    match trimmed.rfind('/') {
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None => ("", trimmed),
    }
}

fn check_name(name: &str) -> io::Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{name}' is not a plain file name"),
        ));
    }
    Ok(())
}

/// An in-memory directory tree. Clones share the same tree.
#[derive(Clone, Debug)]
pub struct MemoryFs {
    tree_id: u64,
    inner: Arc<Mutex<Tree>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut tree = Tree::default();
        tree.dirs.insert(
            ROOT,
            DirNode {
                name: String::from("/"),
                children: BTreeMap::new(),
            },
        );
        Self {
            tree_id: NEXT_TREE.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, node: u64, name: String) -> DirHandle {
        DirHandle::new(MemDir {
            fs: self.clone(),
            node,
            id: ResourceId::Memory {
                tree: self.tree_id,
                node,
            },
            name,
        })
    }

    pub fn root(&self) -> DirHandle {
        self.handle(ROOT, String::from("/"))
    }

    /// Create `path` and any missing parents, returning a handle to it.
    pub fn create_dir(&self, path: &str) -> DirHandle {
        let mut tree = self.lock();
        let node = tree.ensure_dir(path);
        let name = tree.dirs.get(&node).map(|d| d.name.clone()).unwrap_or_default();
        drop(tree);
        self.handle(node, name)
    }

    pub fn dir(&self, path: &str) -> Option<DirHandle> {
        let tree = self.lock();
        let node = tree.lookup_dir(path)?;
        let name = tree.dirs.get(&node)?.name.clone();
        drop(tree);
        Some(self.handle(node, name))
    }

    /// Write a file, creating parent directories as needed.
    pub fn write(&self, path: &str, contents: &[u8]) {
        let (parent, name) = split_parent(path);
        let mut tree = self.lock();
        let node = tree.ensure_dir(parent);
        if let Some(dir) = tree.dirs.get_mut(&node) {
            dir.children.insert(name.to_string(), Child::File(contents.to_vec()));
        }
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let (parent, name) = split_parent(path);
        let tree = self.lock();
        let node = tree.lookup_dir(parent)?;
        match tree.dirs.get(&node)?.children.get(name)? {
            Child::File(bytes) => Some(bytes.clone()),
            Child::Dir(_) => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        let (parent, name) = split_parent(path);
        let tree = self.lock();
        tree.lookup_dir(parent)
            .and_then(|node| tree.dirs.get(&node))
            .is_some_and(|d| name.is_empty() || d.children.contains_key(name))
    }

    /// Names of the files (not directories) directly inside `dir_path`, sorted.
    pub fn file_names(&self, dir_path: &str) -> Vec<String> {
        let tree = self.lock();
        tree.lookup_dir(dir_path)
            .and_then(|node| tree.dirs.get(&node))
            .map(|d| {
                d.children
                    .iter()
                    .filter(|(_, c)| matches!(c, Child::File(_)))
                    .map(|(n, _)| n.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Make reads of the file at `path` fail.
    pub fn fail_reads(&self, path: &str) {
        let (parent, name) = split_parent(path);
        let mut tree = self.lock();
        let node = tree.ensure_dir(parent);
        tree.fail_reads.insert((node, name.to_string()));
    }

    /// Make committed writes of any file inside `dir_path` fail.
    pub fn fail_writes_in(&self, dir_path: &str) {
        let mut tree = self.lock();
        let node = tree.ensure_dir(dir_path);
        tree.fail_writes.insert(node);
    }

    /// Make removal of the entry at `path` fail.
    pub fn fail_removes(&self, path: &str) {
        let (parent, name) = split_parent(path);
        let mut tree = self.lock();
        let node = tree.ensure_dir(parent);
        tree.fail_removes.insert((node, name.to_string()));
    }

    /// Revoke access to a directory: every operation through its handle fails.
    pub fn revoke(&self, dir_path: &str) {
        let mut tree = self.lock();
        let node = tree.ensure_dir(dir_path);
        tree.revoked.insert(node);
    }

    pub fn clear_faults(&self) {
        let mut tree = self.lock();
        tree.fail_reads.clear();
        tree.fail_removes.clear();
        tree.fail_writes.clear();
        tree.revoked.clear();
    }
}

struct MemDir {
    fs: MemoryFs,
    node: u64,
    id: ResourceId,
    name: String,
}

impl Directory for MemDir {
    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> io::Result<Vec<Entry>> {
        let tree = self.fs.lock();
        let dir = tree.dir(self.node)?;
        Ok(dir
            .children
            .iter()
            .map(|(name, child)| Entry {
                name: name.clone(),
                kind: match child {
                    Child::File(_) => EntryKind::File,
                    Child::Dir(_) => EntryKind::Directory,
                },
            })
            .collect())
    }

    fn open_dir(&self, name: &str) -> io::Result<DirHandle> {
        check_name(name)?;
        let tree = self.fs.lock();
        match tree.dir(self.node)?.children.get(name) {
            Some(Child::Dir(id)) => {
                let id = *id;
                drop(tree);
                Ok(self.fs.handle(id, name.to_string()))
            }
            Some(Child::File(_)) => Err(io::Error::new(io::ErrorKind::NotADirectory, name.to_string())),
            None => Err(io::Error::new(io::ErrorKind::NotFound, name.to_string())),
        }
    }

    fn open_file(&self, name: &str) -> io::Result<FileHandle> {
        check_name(name)?;
        let tree = self.fs.lock();
        match tree.dir(self.node)?.children.get(name) {
            Some(Child::File(_)) => Ok(FileHandle::new(MemFile {
                fs: self.fs.clone(),
                dir: self.node,
                name: name.to_string(),
            })),
            Some(Child::Dir(_)) => Err(io::Error::new(io::ErrorKind::IsADirectory, name.to_string())),
            None => Err(io::Error::new(io::ErrorKind::NotFound, name.to_string())),
        }
    }

    fn contains(&self, name: &str) -> io::Result<bool> {
        check_name(name)?;
        let tree = self.fs.lock();
        Ok(tree.dir(self.node)?.children.contains_key(name))
    }

    fn create_file(&self, name: &str) -> io::Result<FileHandle> {
        check_name(name)?;
        let mut tree = self.fs.lock();
        let dir = tree.dir_mut(self.node)?;
        if dir.children.contains_key(name) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, name.to_string()));
        }
        dir.children.insert(name.to_string(), Child::File(Vec::new()));
        Ok(FileHandle::new(MemFile {
            fs: self.fs.clone(),
            dir: self.node,
            name: name.to_string(),
        }))
    }

    fn remove_entry(&self, name: &str) -> io::Result<()> {
        check_name(name)?;
        let mut tree = self.fs.lock();
        if tree.fail_removes.contains(&(self.node, name.to_string())) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected remove failure"));
        }
        let removed = tree
            .dir_mut(self.node)?
            .children
            .remove(name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))?;
        if let Child::Dir(id) = removed {
            tree.drop_subtree(id);
        }
        Ok(())
    }
}

struct MemFile {
    fs: MemoryFs,
    dir: u64,
    name: String,
}

impl FileObject for MemFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        let tree = self.fs.lock();
        if tree.fail_reads.contains(&(self.dir, self.name.clone())) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected read failure"));
        }
        match tree.dir(self.dir)?.children.get(&self.name) {
            Some(Child::File(bytes)) => Ok(bytes.clone()),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, self.name.clone())),
        }
    }

    fn write_committed(&self, contents: &[u8]) -> io::Result<()> {
        let mut tree = self.fs.lock();
        if tree.fail_writes.contains(&self.dir) {
            return Err(io::Error::other("injected write failure"));
        }
        match tree.dir_mut(self.dir)?.children.get_mut(&self.name) {
            Some(Child::File(bytes)) => {
                *bytes = contents.to_vec();
                Ok(())
            }
            _ => Err(io::Error::new(io::ErrorKind::NotFound, self.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_through_handles() {
        let fs = MemoryFs::new();
        fs.write("pics/a.png", b"A");
        let pics = fs.dir("pics").unwrap();
        let file = pics.open_file("a.png").unwrap();
        assert_eq!(file.read_all().unwrap(), b"A");
        assert!(pics.contains("a.png").unwrap());
        assert!(!pics.contains("b.png").unwrap());
    }

    #[test]
    fn handles_compare_by_node_not_name() {
        let fs = MemoryFs::new();
        let a = fs.create_dir("x/same");
        let b = fs.create_dir("y/same");
        assert_ne!(a, b);
        assert_eq!(a, fs.dir("x/same").unwrap());
        assert_ne!(MemoryFs::new().root(), fs.root());
    }

    #[test]
    fn revoked_directory_refuses_everything() {
        let fs = MemoryFs::new();
        fs.write("src/a.png", b"A");
        let src = fs.dir("src").unwrap();
        fs.revoke("src");
        assert_eq!(src.entries().unwrap_err().kind(), io::ErrorKind::PermissionDenied);
        assert!(src.create_file("b.png").is_err());
    }

    #[test]
    fn removing_a_directory_invalidates_its_handle() {
        let fs = MemoryFs::new();
        fs.write("a/b/c.png", b"C");
        let b = fs.dir("a/b").unwrap();
        fs.dir("a").unwrap().remove_entry("b").unwrap();
        assert_eq!(b.entries().unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(!fs.exists("a/b/c.png"));
    }

    #[test]
    fn injected_faults_fire_and_clear() {
        let fs = MemoryFs::new();
        fs.write("d/a.png", b"A");
        fs.fail_writes_in("d");
        fs.fail_removes("d/a.png");
        let d = fs.dir("d").unwrap();
        let created = d.create_file("b.png").unwrap();
        assert!(created.write_committed(b"B").is_err());
        assert!(d.remove_entry("a.png").is_err());
        fs.clear_faults();
        created.write_committed(b"B").unwrap();
        d.remove_entry("a.png").unwrap();
        assert_eq!(fs.read("d/b.png").unwrap(), b"B");
        assert_eq!(fs.file_names("d"), ["b.png"]);
    }
}
