//! Command-line interface module for tidyup.
//!
//! Three subcommands share one shape: build a plan, preview it, and only
//! touch the filesystem when `--apply` is given.
//!
//! - `organize` sorts a folder into category subfolders
//! - `rename` renames images after their timestamps
//! - `undo` reverses a previous apply from its log

use crate::audit_log::write_plan_log;
use crate::config::Config;
use crate::error::OrganizeResult;
use crate::file_organizer::FileOrganizer;
use crate::output::OutputFormatter;
use crate::plan::{
    OrganizeOptions, Plan, RenameOptions, UnclassifiedPolicy, build_organize_plan,
    build_rename_plan,
};
use crate::timestamp::{NameFormat, TimeSourceKind, time_source_for};
use crate::undo::UndoManager;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_MAX_PREVIEW: usize = 80;

#[derive(Debug, Parser)]
#[command(
    name = "tidyup",
    version,
    about = "Sort files into category folders or rename images by timestamp",
    long_about = "Sort files into category folders or rename images by timestamp.\n\n\
                  Every command previews by default. Pass --apply to make changes; \
                  each apply writes a CSV log that `tidyup undo` can reverse."
)]
pub struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ./.tidyuprc.toml, then ~/.config/tidyup/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sort files into category folders under a result directory
    Organize(OrganizeArgs),
    /// Rename images to names built from their timestamps
    Rename(RenameArgs),
    /// Reverse the moves recorded in a log
    Undo(UndoArgs),
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    /// Folder to organize
    pub path: PathBuf,

    /// Include files in subfolders
    #[arg(short, long)]
    pub recursive: bool,

    /// Keep each file's relative folder under its category
    #[arg(long)]
    pub keep_structure: bool,

    /// Name of the result folder created inside PATH
    #[arg(long, value_name = "NAME")]
    pub result_dir_name: Option<String>,

    /// Treat .pages/.numbers/.key bundles as files
    #[arg(long)]
    pub include_packages: bool,

    /// Also treat .app bundles as files (needs --include-packages)
    #[arg(long)]
    pub include_app: bool,

    /// What to do with files no category claims
    #[arg(long, value_enum)]
    pub unclassified: Option<UnclassifiedPolicy>,

    /// Number of moves listed in the preview
    #[arg(long, default_value_t = DEFAULT_MAX_PREVIEW)]
    pub max_preview: usize,

    /// Log file (default: <result dir>/_logs/sort-log-<time>.csv)
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Perform the moves
    #[arg(long)]
    pub apply: bool,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Folder containing the images
    pub path: PathBuf,

    /// Include images in subfolders (each renamed in place)
    #[arg(short, long)]
    pub recursive: bool,

    /// Extension to include; repeatable (default: common image types)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Which timestamp names are built from
    #[arg(long, value_enum)]
    pub time_source: Option<TimeSourceKind>,

    /// Name layout
    #[arg(long, value_enum)]
    pub format: Option<NameFormat>,

    /// Do not prefix names with the parent folder's name
    #[arg(long)]
    pub no_folder_prefix: bool,

    /// Number of renames listed in the preview
    #[arg(long, default_value_t = DEFAULT_MAX_PREVIEW)]
    pub max_preview: usize,

    /// Log file (default: <PATH>/rename-log-<time>.csv)
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Perform the renames
    #[arg(long)]
    pub apply: bool,
}

#[derive(Debug, Args)]
pub struct UndoArgs {
    /// Log written by an earlier apply
    pub log: PathBuf,

    /// Perform the moves back
    #[arg(long)]
    pub apply: bool,
}

/// What a successful command run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Moves made, or that would be made on a dry run.
    pub changed: usize,
    /// Items whose move failed.
    pub failed: usize,
}

/// Runs a parsed command line.
///
/// # Errors
///
/// Returns an error for anything that stops a run before it starts or while
/// its log is being written: an invalid root, bad configuration, an unreadable
/// log. Per-item failures are counted in [`RunOutcome::failed`].
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use tidyup::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["tidyup", "organize", "/path/to/Downloads"]);
/// let outcome = run_cli(&cli)?;
/// println!("{} moves planned", outcome.changed);
/// # Ok::<(), tidyup::error::OrganizeError>(())
/// ```
pub fn run_cli(cli: &Cli) -> OrganizeResult<RunOutcome> {
    let config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Organize(args) => organize(args, &config),
        Command::Rename(args) => rename(args, &config),
        Command::Undo(args) => undo(args),
    }
}

fn run_stamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Flags win over configuration; a switch only turns a setting on.
fn organize_options(args: &OrganizeArgs, config: &Config) -> OrganizeResult<OrganizeOptions> {
    let settings = &config.organize;
    let unclassified = match args.unclassified {
        Some(policy) => policy,
        None => settings.unclassified.parse()?,
    };
    Ok(OrganizeOptions {
        result_dir_name: args
            .result_dir_name
            .clone()
            .unwrap_or_else(|| settings.result_dir_name.clone()),
        recursive: args.recursive || settings.recursive,
        keep_structure: args.keep_structure || settings.keep_structure,
        include_packages: args.include_packages || settings.include_packages,
        include_app: args.include_app || settings.include_app,
        unclassified,
    })
}

fn rename_options(
    args: &RenameArgs,
    config: &Config,
) -> OrganizeResult<(RenameOptions, TimeSourceKind)> {
    let settings = &config.rename;
    let format = match args.format {
        Some(format) => format,
        None => settings.format.parse()?,
    };
    let time_source = match args.time_source {
        Some(kind) => kind,
        None => settings.time_source.parse()?,
    };
    let extensions = if args.extensions.is_empty() {
        settings.extensions.clone()
    } else {
        args.extensions.clone()
    };
    let options = RenameOptions {
        recursive: args.recursive || settings.recursive,
        extensions,
        format,
        folder_prefix: settings.folder_prefix && !args.no_folder_prefix,
    };
    Ok((options, time_source))
}

fn apply_plan(plan: &Plan, log: Option<&PathBuf>) -> OrganizeResult<RunOutcome> {
    let log_path = log
        .cloned()
        .unwrap_or_else(|| plan.default_log_path(&run_stamp()));

    let pb = OutputFormatter::create_progress_bar(plan.len() as u64);
    let result = FileOrganizer::apply_with_progress(plan, &log_path, &pb);
    pb.finish_and_clear();
    let report = result?;

    OutputFormatter::apply_summary(&report);
    Ok(RunOutcome {
        changed: report.moved,
        failed: report.failures.len(),
    })
}

fn organize(args: &OrganizeArgs, config: &Config) -> OrganizeResult<RunOutcome> {
    let options = organize_options(args, config)?;
    let filters = config.filters.compile()?;
    tracing::info!(root = %args.path.display(), ?options, "planning organize");

    let plan = build_organize_plan(&args.path, &options, &filters)?;
    OutputFormatter::plan_preview(&plan, args.max_preview);

    if plan.is_empty() {
        return Ok(RunOutcome::default());
    }
    if !args.apply {
        OutputFormatter::dry_run_notice("No files were moved. Run again with --apply to move them.");
        return Ok(RunOutcome {
            changed: plan.len(),
            failed: 0,
        });
    }
    apply_plan(&plan, args.log.as_ref())
}

fn rename(args: &RenameArgs, config: &Config) -> OrganizeResult<RunOutcome> {
    let (options, kind) = rename_options(args, config)?;
    let filters = config.filters.compile()?;
    let time_source = time_source_for(kind);
    tracing::info!(root = %args.path.display(), ?options, ?kind, "planning rename");

    let plan = build_rename_plan(&args.path, &options, time_source.as_ref(), &filters)?;
    OutputFormatter::plan_preview(&plan, args.max_preview);

    if plan.is_empty() {
        return Ok(RunOutcome::default());
    }
    if !args.apply {
        let plan_path = args
            .log
            .clone()
            .unwrap_or_else(|| plan.default_log_path(&run_stamp()));
        let written = write_plan_log(&plan_path, &plan)?;
        OutputFormatter::info(&format!("Plan written to {}", written.display()));
        OutputFormatter::dry_run_notice("No files were renamed. Run again with --apply to rename them.");
        return Ok(RunOutcome {
            changed: plan.len(),
            failed: 0,
        });
    }
    apply_plan(&plan, args.log.as_ref())
}

fn undo(args: &UndoArgs) -> OrganizeResult<RunOutcome> {
    OutputFormatter::info(&format!("Undoing moves from {}", args.log.display()));
    let report = UndoManager::undo(&args.log, args.apply)?;
    OutputFormatter::undo_summary(&report);
    Ok(RunOutcome {
        changed: report.changed(),
        failed: report.failed(),
    })
}
