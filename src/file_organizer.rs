//! Plan execution.
//!
//! [`FileOrganizer::apply`] performs the moves of a [`Plan`] in order and
//! writes one audit-log row per attempted move. A failed move is recorded and
//! the run continues; only a failure to write the log itself aborts.

use crate::audit_log::{AuditLogWriter, ItemStatus};
use crate::collision::{self, ClaimSet};
use crate::error::OrganizeResult;
use crate::plan::{Plan, PlanItem};
use indicatif::ProgressBar;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Why a single move failed.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("source no longer exists: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot move {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("copied to {} but cannot remove {}: {source}", to.display(), from.display())]
    RemoveSource {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A move that did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: String,
}

/// Summary of one apply run.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// Log actually written.
    pub log_path: PathBuf,
    pub moved: usize,
    pub failures: Vec<FailedMove>,
    /// Items whose planned destination was taken by apply time.
    pub rerouted: usize,
}

impl ApplyReport {
    pub fn attempted(&self) -> usize {
        self.moved + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Executes plans.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Applies `plan`, logging to `log_path`.
    ///
    /// # Errors
    ///
    /// Fails only if the log cannot be created or written. Individual move
    /// failures are reported in [`ApplyReport::failures`]. A row write that
    /// fails right after a successful move stops the run and leaves that one
    /// move unrecorded in the log.
    pub fn apply(plan: &Plan, log_path: &Path) -> OrganizeResult<ApplyReport> {
        Self::apply_with_progress(plan, log_path, &ProgressBar::hidden())
    }

    /// Same as [`FileOrganizer::apply`], ticking `progress` once per item.
    pub fn apply_with_progress(
        plan: &Plan,
        log_path: &Path,
        progress: &ProgressBar,
    ) -> OrganizeResult<ApplyReport> {
        let mut log = AuditLogWriter::create(log_path, plan.schema())?;
        let mut report = ApplyReport {
            log_path: log.path().to_path_buf(),
            ..Default::default()
        };
        tracing::info!(items = plan.len(), log = %report.log_path.display(), "applying plan");

        // Destinations of items not yet attempted stay reserved for them.
        let mut pending = ClaimSet::new();
        for item in &plan.items {
            pending.claim(&item.destination);
        }

        for item in &plan.items {
            pending.release(&item.destination);
            progress.set_message(display_name(&item.source));

            let (destination, result) = Self::apply_item(item, &pending);
            if destination != item.destination {
                report.rerouted += 1;
            }

            match result {
                Ok(()) => {
                    tracing::debug!(
                        source = %item.source.display(),
                        destination = %destination.display(),
                        "moved"
                    );
                    if let Err(err) = log.append(item, &destination, ItemStatus::Moved, "") {
                        tracing::warn!(
                            source = %item.source.display(),
                            destination = %destination.display(),
                            error = %err,
                            "moved but not logged, undo will not restore this file"
                        );
                        return Err(err);
                    }
                    report.moved += 1;
                }
                Err(err) => {
                    let error = err.to_string();
                    tracing::warn!(source = %item.source.display(), error = %error, "move failed");
                    log.append(item, &destination, ItemStatus::Failed, &error)?;
                    report.failures.push(FailedMove {
                        source: item.source.clone(),
                        destination,
                        error,
                    });
                }
            }
            progress.inc(1);
        }

        tracing::info!(
            moved = report.moved,
            failed = report.failures.len(),
            "apply finished"
        );
        Ok(report)
    }

    fn apply_item(item: &PlanItem, pending: &ClaimSet) -> (PathBuf, Result<(), MoveError>) {
        let mut destination = item.destination.clone();

        if let Some(parent) = destination.parent()
            && let Err(source) = fs::create_dir_all(parent)
        {
            let path = parent.to_path_buf();
            return (destination, Err(MoveError::CreateDir { path, source }));
        }

        if fs::symlink_metadata(&destination).is_ok() {
            let fresh = collision::resolve(&destination, pending);
            tracing::info!(
                planned = %destination.display(),
                destination = %fresh.display(),
                "planned destination appeared since planning"
            );
            destination = fresh;
        }

        let result = move_path(&item.source, &destination);
        (destination, result)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Moves `from` to `to`, copying then removing when they are on different
/// filesystems. `to` must not exist.
pub fn move_path(from: &Path, to: &Path) -> Result<(), MoveError> {
    if fs::symlink_metadata(from).is_err() {
        return Err(MoveError::SourceMissing(from.to_path_buf()));
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            tracing::debug!(from = %from.display(), to = %to.display(), "crossing filesystems, copying");
            copy_then_remove(from, to)
        }
        Err(source) => Err(MoveError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> Result<(), MoveError> {
    let copy_error = |source: io::Error| MoveError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    let remove_error = |source: io::Error| MoveError::RemoveSource {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if from.is_dir() {
        copy_dir_recursive(from, to).map_err(copy_error)?;
        fs::remove_dir_all(from).map_err(remove_error)
    } else {
        fs::copy(from, to).map_err(copy_error)?;
        fs::remove_file(from).map_err(remove_error)
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
