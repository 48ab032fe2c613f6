//! Config validation logic.
//! Verifies directory existence, readability/writability and that source and
//! destination are different directories.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::types::Config;
use crate::errors::RelocateError;
use crate::platform::set_dir_mode_0700;

/// Source and destination after validation, canonicalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDirs {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl Config {
    /// Validate source/destination and return their canonical paths.
    ///
    /// - source must exist, be a directory, and be readable.
    /// - destination is created if missing and must be writable.
    /// - the two must not resolve to the same path.
    pub fn validate(&self) -> Result<ValidatedDirs> {
        let src = self.source_dir.as_deref().ok_or(RelocateError::NoSourceSelected)?;
        let dst = self.dest_dir.as_deref().ok_or(RelocateError::NoDestinationSelected)?;

        ensure_dir_exists_and_is_dir(src, "source_dir")?;
        ensure_readable(src, "source_dir")?;

        ensure_dir_is_or_create(dst, "dest_dir")?;
        ensure_writable(dst, "dest_dir")?;

        let src_real = dunce::canonicalize(src).unwrap_or_else(|_| src.to_path_buf());
        let dst_real = dunce::canonicalize(dst).unwrap_or_else(|_| dst.to_path_buf());
        if src_real == dst_real {
            error!(path = %src_real.display(), "source and destination resolve to the same path");
            return Err(RelocateError::SameDirectory)
                .with_context(|| format!("both resolve to '{}'", src_real.display()));
        }
        if self.recursive && dst_real.starts_with(&src_real) {
            warn!(
                "dest_dir '{}' is inside source_dir '{}'; recursive indexing will see moved files",
                dst_real.display(),
                src_real.display()
            );
        }

        info!(
            "Config validated: source='{}' dest='{}' log_file='{}'",
            src_real.display(),
            dst_real.display(),
            self.log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".into())
        );
        Ok(ValidatedDirs {
            source: src_real,
            dest: dst_real,
        })
    }
}

/// Ensure path exists and is a directory; emit clear errors with path context.
fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} does not exist: {}", path.display());
        bail!("{name} does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} is not a directory: {}", path.display());
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

/// Ensure directory is readable by attempting to open its entries.
fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path)
        .with_context(|| format!("Cannot read {name} directory '{}'; check permissions", path.display()))?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}

/// Ensure directory exists (create if missing). If exists, it must be a directory.
fn ensure_dir_is_or_create(path: &Path, name: &str) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            error!("{name} exists but isn't a directory: {}", path.display());
            bail!("{name} exists but isn't a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create {name} directory '{}'", path.display()))?;
        let _ = set_dir_mode_0700(path);
        info!("Created {name} directory: {}", path.display());
    }
    Ok(())
}

/// Ensure directory is writable using a non-destructive probe file.
fn ensure_writable(path: &Path, name: &str) -> Result<()> {
    let probe = path.join(format!(".img_relocate_probe_{}.tmp", std::process::id()));
    fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&probe)
        .with_context(|| format!("Cannot write to {name} '{}'; check permissions", path.display()))?;
    let _ = fs::remove_file(&probe);
    debug!("{name} writable: {}", path.display());
    Ok(())
}
