//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler,
//! validates directories, then runs one of: preview, dry run, batch move,
//! manual picks, or the interactive shell.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, warn};

use img_relocate::cli::Args;
use img_relocate::output as out;
use img_relocate::{
    CONFIG_ENV, Config, LoadResult, LocalDir, RelocateError, RelocationSession, default_config_path,
    entry_for_path, load_or_init, shell, shutdown,
};

use crate::logging::init_tracing;

fn print_config_location() {
    if let Ok(cfg_env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {cfg_env}\n"));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default img_relocate config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run without --print-config to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(());
    }

    let mut cfg = match load_or_init()? {
        LoadResult::Loaded(cfg, _) => *cfg,
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!("A template img_relocate config was written to: {}", path.display()));
            out::print_info("Edit it to set `source_dir` and `dest_dir`, or pass --source/--dest.");
            if args.source.is_none() && args.dest.is_none() && args.files.is_empty() {
                return Ok(());
            }
            Config::default()
        }
        LoadResult::Missing(_) => Config::default(),
    };
    args.apply_overrides(&mut cfg);

    // Initialize logging; the guard flushes the file layer when dropped
    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).inspect_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
    })?;

    // The current file always runs to completion, so the log guard is only
    // released once dispatch has returned.
    ctrlc::set_handler(|| {
        shutdown::request();
        out::print_warn("Received interrupt; finishing the current file...");
    })
    .context("install Ctrl-C handler")?;

    debug!("Starting img_relocate: {:?}", args);

    let result = dispatch(&args, &cfg);
    if let Err(e) = &result {
        if let Some(re) = e.downcast_ref::<RelocateError>() {
            error!(code = re.code(), error = %e, "run failed");
        } else {
            error!(error = %format!("{e:#}"), "run failed");
        }
    }

    drop(guard);
    result
}

fn dispatch(args: &Args, cfg: &Config) -> Result<()> {
    let mut session = RelocationSession::new();
    session.set_recursive(cfg.recursive);
    session.set_matcher(cfg.extensions.clone());
    session.set_stop_flag(shutdown::global().clone());

    if !args.files.is_empty() {
        return move_picked_files(args, cfg, &mut session);
    }

    let dirs = cfg.validate()?;
    let source = LocalDir::open_with(&dirs.source, cfg.durability)
        .with_context(|| format!("open source '{}'", dirs.source.display()))?;
    let dest = LocalDir::open_with(&dirs.dest, cfg.durability)
        .with_context(|| format!("open destination '{}'", dirs.dest.display()))?;
    session.set_source(source);
    session.set_destination(dest);

    if args.interactive {
        return shell::run_shell(&mut session, shutdown::global(), cfg.dry_run);
    }

    if args.preview {
        out::print_preview(session.index()?);
        return Ok(());
    }

    if !args.select.is_empty() {
        let indices = args.selection_indices().map_err(|e| anyhow!(e))?;
        session.index()?;
        if cfg.dry_run {
            out::print_plan(&session.plan_selected(&indices)?);
        } else {
            out::report_batch(&session.relocate_selected(&indices)?);
        }
        return Ok(());
    }

    if cfg.dry_run {
        out::print_plan(&session.plan_all()?);
    } else {
        out::report_batch(&session.relocate_all()?);
    }
    Ok(())
}

/// Move files named on the command line. Missing files are skipped with a warning.
fn move_picked_files(args: &Args, cfg: &Config, session: &mut RelocationSession) -> Result<()> {
    let dest_path = cfg.dest_dir.as_deref().ok_or(RelocateError::NoDestinationSelected)?;
    if !dest_path.exists() {
        std::fs::create_dir_all(dest_path)
            .with_context(|| format!("Failed to create dest_dir '{}'", dest_path.display()))?;
    }
    let dest = LocalDir::open_with(dest_path, cfg.durability)
        .with_context(|| format!("open destination '{}'", dest_path.display()))?;
    session.set_destination(dest);

    let mut entries = Vec::new();
    for path in args.resolved_files() {
        match entry_for_path(&path, cfg.durability) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                out::print_warn(&format!("Skipping '{}': {e}", path.display()));
            }
        }
    }
    session.pick(entries);
    if session.picks().is_empty() {
        return Err(RelocateError::EmptySelection.into());
    }

    if cfg.dry_run {
        out::print_plan(&session.plan_picks()?);
    } else {
        out::report_batch(&session.relocate_picks()?);
    }
    Ok(())
}
