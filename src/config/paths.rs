//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors for safety.

use anyhow::{Context, Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

const APP_DIR: &str = "img_relocate";
const CONFIG_FILE: &str = "config.xml";
const LOG_FILE: &str = "img_relocate.log";

/// Config path: `$IMG_RELOCATE_CONFIG` if set, else the OS config dir.
///
/// A relative override is resolved against the current directory; an override
/// naming a directory means `<dir>/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV) {
        let mut p = PathBuf::from(raw);
        if p.as_os_str().is_empty() {
            return Err(anyhow!("{CONFIG_ENV} is set but empty"));
        }
        if p.is_relative() {
            p = env::current_dir()
                .context("resolve current directory for relative config path")?
                .join(p);
        }
        if p.is_dir() {
            p.push(CONFIG_FILE);
        }
        return Ok(p);
    }

    let base = config_dir()
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or_else(|| anyhow!("could not determine a config directory"))?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Default log file: next to an overridden config file, else in the OS data dir.
pub fn default_log_path() -> Result<PathBuf> {
    if env::var_os(CONFIG_ENV).is_some() {
        let cfg = default_config_path()?;
        if let Some(parent) = cfg.parent() {
            return Ok(parent.join(LOG_FILE));
        }
    }

    let base = data_dir()
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share")))
        .ok_or_else(|| anyhow!("could not determine a data directory"))?;
    let dir = base.join(APP_DIR);
    // best-effort; the logging layer reports a real failure when it opens the file
    let _ = fs::create_dir_all(&dir);
    Ok(dir.join(LOG_FILE))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
