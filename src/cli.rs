//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --select takes the 1-based numbers printed by --preview.

use clap::{ArgAction, Parser, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::{Config, LogLevel};
use crate::fs_ops::ExtensionMatcher;
use crate::handle::DurabilityMode;

/// Move image files from a source directory into a destination directory
/// without overwriting anything. CLI flags override config values (loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Batch-move image files safely, with undo (interactive mode)")]
pub struct Args {
    /// Individual files to move (instead of indexing --source).
    #[arg(value_name = "FILES", value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// Directory to take images from.
    #[arg(long, short = 's', value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Directory to move images into (created if missing).
    #[arg(long = "dest", short = 'd', value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub dest: Option<PathBuf>,

    /// Include subfolders of the source.
    #[arg(long, overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Only the top level of the source.
    #[arg(long, overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Comma separated extensions to treat as images, e.g. "jpg,png".
    #[arg(long, value_name = "LIST")]
    pub ext: Option<String>,

    /// List the files that would be considered, numbered, then exit.
    #[arg(long)]
    pub preview: bool,

    /// Move only these entries of the preview listing (1-based, comma separated).
    #[arg(long, value_name = "N,N,...", value_delimiter = ',', action = ArgAction::Append)]
    pub select: Vec<usize>,

    /// Start an interactive session (preview, move, undo).
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Show what would be moved and the names it would get, but change nothing.
    #[arg(long, help = "Show what would be done, but do not modify files")]
    pub dry_run: bool,

    /// Durability of each write: full (fsync) or data (flush only).
    #[arg(long, value_name = "MODE")]
    pub durability: Option<DurabilityMode>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(long, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Print where img_relocate will look for the config file, then exit.
    #[arg(long, help = "Print the config file location used by img_relocate and exit")]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Recursive flag from the command line, if given.
    pub fn recursive_override(&self) -> Option<bool> {
        match (self.recursive, self.no_recursive) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// `--select` converted to 0-based preview indices. Zero is rejected.
    pub fn selection_indices(&self) -> Result<Vec<usize>, String> {
        self.select
            .iter()
            .map(|&n| n.checked_sub(1).ok_or_else(|| "selection numbers start at 1".to_string()))
            .collect()
    }

    /// Manual picks with stray shell quotes removed.
    pub fn resolved_files(&self) -> Vec<PathBuf> {
        self.files.iter().map(|p| sanitize_path(p)).collect()
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(s) = &self.source {
            cfg.source_dir = Some(sanitize_path(s));
        }
        if let Some(d) = &self.dest {
            cfg.dest_dir = Some(sanitize_path(d));
        }
        if let Some(r) = self.recursive_override() {
            cfg.recursive = r;
        }
        if let Some(list) = &self.ext {
            cfg.extensions = ExtensionMatcher::parse_list(list);
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(mode) = self.durability {
            cfg.durability = mode;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
    }
}

/// Trim surrounding quotes left behind by PowerShell/CMD quoting, and one
/// trailing separator (but never reduce a root like "/" to nothing).
pub fn sanitize_path(p: &Path) -> PathBuf {
    let raw = p.to_string_lossy();
    let trimmed = raw.trim();
    let mut inner = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.trim_matches(|c| c == '\'' || c == '"').to_string()
    };
    if inner.len() > 1 && (inner.ends_with('\\') || inner.ends_with('/')) {
        inner.pop();
    }
    PathBuf::from(inner)
}

pub fn parse() -> Args {
    Args::parse()
}
