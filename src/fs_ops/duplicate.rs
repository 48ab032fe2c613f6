//! Collision-free naming inside a destination directory.
//!
//! Policy:
//! - Move: keep the requested name if free, else `base_2.ext`, `base_3.ext`, ...
//! - Restore: keep the original name if free, else `base_restored_1.ext`, `base_restored_2.ext`, ...
//!
//! The split between base and extension happens at the last `.`, so
//! `archive.tar.gz` becomes `archive.tar_2.gz` and `.env` becomes `_2.env`.
//!
//! Every candidate is probed and then created exclusively. A name taken by
//! someone else between the probe and the create is skipped, never clobbered.

use std::collections::HashSet;
use std::io;
use tracing::{debug, trace};

use crate::handle::{DirHandle, FileHandle};

// Typical POSIX/EXT limit, in bytes.
const MAX_FILENAME_LEN: usize = 255;

/// Which counter token is inserted before the extension on collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixStyle {
    /// `_N`, N starting at 2.
    Move,
    /// `_restored_N`, N starting at 1.
    Restore,
}

impl SuffixStyle {
    fn first(self) -> u64 {
        match self {
            SuffixStyle::Move => 2,
            SuffixStyle::Restore => 1,
        }
    }

    fn token(self, n: u64) -> String {
        match self {
            SuffixStyle::Move => format!("_{n}"),
            SuffixStyle::Restore => format!("_restored_{n}"),
        }
    }
}

/// Split `name` at its last `.` into `(base, ext)`; `ext` keeps the dot.
///
/// - "photo.png" -> ("photo", ".png")
/// - "README" -> ("README", "")
/// - ".env" -> ("", ".env")
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) => name.split_at(i),
        None => (name, ""),
    }
}

/// Truncate `base` if needed so `base + suffix + ext` fits within MAX_FILENAME_LEN.
fn build_name_with_suffix(base: &str, ext: &str, suffix: &str) -> String {
    let overhead = suffix.len() + ext.len();
    let mut base = base;
    if base.len() + overhead > MAX_FILENAME_LEN {
        let room = MAX_FILENAME_LEN.saturating_sub(overhead);
        let mut cut = room.min(base.len());
        while cut > 0 && !base.is_char_boundary(cut) {
            cut -= 1;
        }
        base = if cut == 0 { "f" } else { &base[..cut] };
    }
    format!("{base}{suffix}{ext}")
}

/// Candidate names in the order they are tried: the requested name, then numbered variants.
fn candidates(desired: &str, style: SuffixStyle) -> impl Iterator<Item = String> + '_ {
    let (base, ext) = split_name(desired);
    std::iter::once(build_name_with_suffix(base, ext, ""))
        .chain((style.first()..).map(move |n| build_name_with_suffix(base, ext, &style.token(n))))
}

fn resolve_with(dir: &DirHandle, desired: &str, style: SuffixStyle) -> io::Result<(FileHandle, String)> {
    let mut collisions = 0u32;
    for candidate in candidates(desired, style) {
        if !dir.contains(&candidate)? {
            match dir.create_file(&candidate) {
                Ok(handle) => {
                    if candidate != desired {
                        debug!(requested = desired, chosen = %candidate, dir = dir.name(), "name collision resolved");
                    }
                    return Ok((handle, candidate));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    trace!(name = %candidate, "name taken between probe and create; trying next");
                }
                Err(e) => return Err(e),
            }
        }
        collisions = collisions.saturating_add(1);
        if collisions == 3 {
            trace!(name = desired, dir = dir.name(), "multiple collisions, continuing to search unique suffix");
        }
    }
    // The candidate sequence is unbounded; this is only reached if it is exhausted.
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for '{desired}'"),
    ))
}

/// Create a new empty file in `dir` named `desired` or its first free `_N` variant.
pub fn resolve_unique_name(dir: &DirHandle, desired: &str) -> io::Result<(FileHandle, String)> {
    resolve_with(dir, desired, SuffixStyle::Move)
}

/// Create a new empty file in `dir` named `original` or its first free `_restored_N` variant.
pub fn resolve_restore_name(dir: &DirHandle, original: &str) -> io::Result<(FileHandle, String)> {
    resolve_with(dir, original, SuffixStyle::Restore)
}

/// Predict the name `resolve_unique_name` would pick, without creating anything.
/// Names in `reserved` (planned earlier in the same batch) count as taken.
pub fn preview_unique_name(dir: &DirHandle, desired: &str, reserved: &HashSet<String>) -> io::Result<String> {
    for candidate in candidates(desired, SuffixStyle::Move) {
        if !reserved.contains(&candidate) && !dir.contains(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for '{desired}'"),
    ))
}
