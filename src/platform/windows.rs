//! Windows implementations of platform helpers (best-effort, no ACL management).
//!
//! Notes:
//! - Windows lacks POSIX mode semantics; mode setters are no-ops.
//! - Directory identity falls back to the canonical path.

use anyhow::{Result, bail};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::handle::ResourceId;

/// Canonical path of the object at `path` (no `\\?\` prefix).
pub fn resource_id(path: &Path) -> io::Result<ResourceId> {
    Ok(ResourceId::Canonical(dunce::canonicalize(path)?))
}

/// Directory fsync is not available through std on Windows.
pub fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Open log file for appending (no symlink defense available via std on Windows).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Write a new config file atomically (temp + rename). Fails if the target exists.
pub fn write_config_secure_new_0600(path: &Path, contents: &[u8]) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    fs::create_dir_all(parent)?;

    let tmp = super::tmp_sibling_name(path);
    let mut f = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    drop(f);
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// No-op on Windows.
pub fn set_dir_mode_0700(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// No-op on Windows.
pub fn set_file_mode_0600(_path: &Path) -> io::Result<()> {
    Ok(())
}
