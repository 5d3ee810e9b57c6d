//! tidyup - folder organization with previews, audit logs and undo
//!
//! Two tools share one pipeline. The organizer sorts a folder's files into
//! category subfolders of a result directory; the renamer gives images
//! sortable names built from their timestamps. Both build a [`Plan`] first,
//! show it, and only move files when asked to apply it. Every apply writes a
//! CSV log that [`UndoManager`] can reverse.

pub mod audit_log;
pub mod cli;
pub mod collision;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod plan;
pub mod scanner;
pub mod timestamp;
pub mod undo;

pub use config::{CompiledFilters, Config, ConfigError};
pub use error::{OrganizeError, OrganizeResult};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{ApplyReport, FileOrganizer};
pub use plan::{
    OrganizeOptions, Plan, PlanItem, RenameOptions, build_organize_plan, build_rename_plan,
};
pub use timestamp::{TimestampSource, time_source_for};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Cli, run_cli};
