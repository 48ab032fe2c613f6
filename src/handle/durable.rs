//! Committed writes for the local backend.
//!
//! A write counts as committed once the buffered data has been flushed to the
//! OS and, in `Full` mode, the file and its parent directory have been synced.
//! The relocation engine only deletes a source after this returns `Ok`.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::platform::fsync_dir;

const BUF_SIZE: usize = 1024 * 1024;

/// Durability mode controlling post-write flush behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DurabilityMode {
    /// Data reaches the OS page cache (`flush`) but no disk barrier is forced.
    Data,
    /// Data and metadata are forced to stable storage (`sync_all`).
    #[default]
    Full,
}

impl DurabilityMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "data" | "flush" | "fast" => Some(DurabilityMode::Data),
            "full" | "sync" => Some(DurabilityMode::Full),
            _ => None,
        }
    }
}

impl fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DurabilityMode::Data => "data",
            DurabilityMode::Full => "full",
        })
    }
}

impl FromStr for DurabilityMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid durability mode: '{s}'"))
    }
}

/// Result of a committed write.
#[derive(Debug, Clone, Copy)]
pub struct CommitResult {
    pub bytes: u64,
    pub mode: DurabilityMode,
}

/// Truncate `dst` (which must already exist) and write `contents` to it.
pub fn write_committed(dst: &Path, contents: &[u8], mode: DurabilityMode) -> io::Result<CommitResult> {
    let file = OpenOptions::new().write(true).truncate(true).open(dst)?;

    let mut writer = BufWriter::with_capacity(BUF_SIZE.min(contents.len().max(1)), file);
    writer.write_all(contents)?;
    writer.flush()?;

    if matches!(mode, DurabilityMode::Full) {
        writer.get_ref().sync_all()?;
        if let Some(parent) = dst.parent() {
            // The new directory entry was created by the caller; persist it as well.
            let _ = fsync_dir(parent);
        }
    }

    Ok(CommitResult {
        bytes: contents.len() as u64,
        mode,
    })
}
