//! Fatal error kinds.
//!
//! Anything in here aborts a run before (or instead of) touching the tree.
//! Per-item failures during apply are [`crate::file_organizer::MoveError`]
//! and end up in the audit log, and undo preconditions are reported as
//! [`crate::undo::UndoOutcome`] values.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a planning, apply or undo run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The root path does not exist.
    #[error("path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The root path exists but is not a directory.
    #[error("path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The result directory name is empty or is not a single path component.
    #[error("invalid result directory name '{0}': expected a single folder name")]
    InvalidResultDirName(String),

    /// The requested timestamp source is not known.
    #[error("unsupported time source '{0}': expected auto, date-added, birthtime or mtime")]
    UnsupportedTimeSource(String),

    /// The requested file name format is not known.
    #[error("unsupported name format '{0}': expected datetime-ms or epoch-ms")]
    UnsupportedNameFormat(String),

    /// The root directory could not be read.
    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A timestamp could not be read while building a rename plan.
    #[error("failed to read timestamp for {}: {source}", path.display())]
    Timestamp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log passed to undo does not exist.
    #[error("log not found: {}", .0.display())]
    LogNotFound(PathBuf),

    /// The audit log could not be created or appended to.
    #[error("failed to write log {}: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The audit log could not be opened or its header is unusable.
    #[error("failed to read log {}: {source}", path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The audit log is readable but lacks the columns undo needs.
    #[error("unrecognized log format in {}: {reason}", path.display())]
    InvalidLogFormat { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for planning, apply and undo operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
