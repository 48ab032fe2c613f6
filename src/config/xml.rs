//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Creates a secure template if missing (unless IMG_RELOCATE_CONFIG is set).
//!
//! Notes:
//! - This module only reads/writes the config file; directory validation happens elsewhere.
//! - Unknown XML fields are a hard error so misconfigurations surface early.

use anyhow::{Context, Result, anyhow};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::CONFIG_ENV;
use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use crate::config::types::{Config, LogLevel};
use crate::fs_ops::ExtensionMatcher;
use crate::handle::DurabilityMode;
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    source_dir: Option<String>,
    dest_dir: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    recursive: Option<bool>,
    extensions: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    durability: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    dry_run: Option<bool>,
}

// Booleans tolerate surrounding whitespace and yes/no/1/0.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => match s.as_str() {
            "true" | "yes" | "1" | "on" => Ok(Some(true)),
            "false" | "no" | "0" | "off" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("invalid boolean '{other}'"))),
        },
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    cfg.source_dir = non_empty(parsed.source_dir.as_deref()).map(PathBuf::from);
    cfg.dest_dir = non_empty(parsed.dest_dir.as_deref()).map(PathBuf::from);
    if let Some(p) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(p));
    }

    if let Some(r) = parsed.recursive {
        cfg.recursive = r;
    }
    if let Some(list) = non_empty(parsed.extensions.as_deref()) {
        cfg.extensions = ExtensionMatcher::parse_list(list);
    }
    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        match s.parse::<LogLevel>() {
            Ok(level) => cfg.log_level = level,
            Err(e) => warn!("{e}; keeping '{}'", cfg.log_level),
        }
    }
    if let Some(s) = non_empty(parsed.durability.as_deref()) {
        match s.parse::<DurabilityMode>() {
            Ok(mode) => cfg.durability = mode,
            Err(e) => warn!("{e}; keeping '{}'", cfg.durability),
        }
    }
    cfg.dry_run = parsed.dry_run.unwrap_or(false);

    cfg
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(xml_to_config(parsed))
}

/// Outcome of [`load_or_init`].
#[derive(Debug)]
pub enum LoadResult {
    /// The config file existed and parsed.
    Loaded(Box<Config>, PathBuf),
    /// No config existed at the default location; a template was written there.
    CreatedTemplate(PathBuf),
    /// No config file; defaults apply (explicit override pointing at a missing file,
    /// or the template could not be written).
    Missing(PathBuf),
}

/// Load the config file, writing a template on first run at the default location.
pub fn load_or_init() -> Result<LoadResult> {
    let path = default_config_path()?;
    if path.exists() {
        let cfg = load_config_from_xml_path(&path)?;
        return Ok(LoadResult::Loaded(Box::new(cfg), path));
    }
    if env::var_os(CONFIG_ENV).is_some() {
        warn!(path = %path.display(), "{CONFIG_ENV} points at a missing file; using defaults");
        return Ok(LoadResult::Missing(path));
    }
    match create_template_config(&path) {
        Ok(()) => Ok(LoadResult::CreatedTemplate(path)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not write template config");
            Ok(LoadResult::Missing(path))
        }
    }
}

/// Create default template config file and parent directory (best-effort permissions).
/// Uses secure creation to avoid following attacker-controlled symlinks on Unix.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/img_relocate.log".into());

    let content = format!(
        "<!--\n  img_relocate configuration (XML)\n\n  source_dir   -> directory images are taken from\n  dest_dir     -> directory images are moved into (created if missing)\n  recursive    -> true/false: include subfolders of source_dir\n  extensions   -> comma separated, e.g. jpg,png,gif (empty = built-in image list)\n  log_level    -> quiet | normal | info | debug\n  log_file     -> path to log file (optional; console output is unaffected)\n  durability   -> full (fsync every file) | data (flush only)\n  dry_run      -> true/false: only print the planned moves\n\n  CLI flags override XML values.\n-->\n<config>\n  <source_dir></source_dir>\n  <dest_dir></dest_dir>\n  <recursive>true</recursive>\n  <extensions>{}</extensions>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <durability>full</durability>\n  <dry_run>false</dry_run>\n</config>\n",
        ExtensionMatcher::images(),
        suggested_log,
    );

    // Atomic, secure write (O_NOFOLLOW + create_new on Unix), then tighten perms.
    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}
