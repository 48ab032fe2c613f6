//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the rest of the codebase can remain platform-agnostic.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(unix)]
pub use unix::{
    fsync_dir, open_log_file_secure_append, resource_id, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};

#[cfg(not(unix))]
pub use windows::{
    fsync_dir, open_log_file_secure_append, resource_id, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};

/// Hidden sibling name used while writing a file that is renamed into place.
pub(crate) fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = format!(".img_relocate.{pid}.{nanos}.tmp");
    target.parent().unwrap_or_else(|| Path::new(".")).join(name)
}
