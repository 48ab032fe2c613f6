//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use crate::fs_ops::ExtensionMatcher;
use crate::handle::DurabilityMode;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for a relocation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory images are taken from
    pub source_dir: Option<PathBuf>,
    /// Directory images are moved into
    pub dest_dir: Option<PathBuf>,
    /// Include subfolders when indexing the source
    pub recursive: bool,
    /// Which file extensions count as images
    pub extensions: ExtensionMatcher,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// How hard each committed write is pushed to disk
    pub durability: DurabilityMode,
    /// If true, print the planned moves but do not modify anything
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: None,
            dest_dir: None,
            recursive: true,
            extensions: ExtensionMatcher::images(),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path().ok(),
            durability: DurabilityMode::Full,
            dry_run: false,
        }
    }
}

impl Config {
    /// Construct a Config with explicit directories; other fields use defaults.
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: Some(source_dir.into()),
            dest_dir: Some(dest_dir.into()),
            ..Default::default()
        }
    }
}
