/// Undo support driven by audit logs.
///
/// An undo walks the `moved` rows of a log in reverse order and moves each
/// file from `new_path` back to `old_path`. Rows are skipped, never forced:
/// nothing is overwritten and nothing missing is recreated.
use crate::audit_log::{ItemStatus, LogRecord, read_log};
use crate::error::OrganizeResult;
use crate::file_organizer::move_path;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one log row during an undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Moved back to its original path.
    Restored,
    /// Would be moved back (dry run).
    WouldRestore,
    /// Nothing exists at the recorded destination any more.
    SkippedMissingDestination,
    /// Something already occupies the original path.
    SkippedSourceExists,
    /// The move back was attempted and failed.
    Failed(String),
}

/// One processed log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub outcome: UndoOutcome,
}

/// Represents the result of an undo run.
#[derive(Debug, Clone, Default)]
pub struct UndoReport {
    pub log_path: PathBuf,
    pub applied: bool,
    /// Entries in processing order (reverse log order).
    pub entries: Vec<UndoEntry>,
    /// Rows not eligible for undo: `failed`, malformed, or unknown status.
    pub ignored_rows: usize,
}

impl UndoReport {
    /// Number of rows restored, or that would be restored on a dry run.
    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, UndoOutcome::Restored | UndoOutcome::WouldRestore))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                UndoOutcome::SkippedMissingDestination | UndoOutcome::SkippedSourceExists
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UndoOutcome::Failed(_)))
    }

    /// Returns true if the undo was completely successful.
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    fn count(&self, predicate: impl Fn(&UndoOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }
}

/// Manages undo operations.
pub struct UndoManager;

impl UndoManager {
    /// Reverses the moves recorded in the log at `log_path`.
    ///
    /// With `apply == false` nothing is touched; the report says what would
    /// happen. Logs without a status column (rename plan files) treat every
    /// row as moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is missing or its header is unrecognized.
    /// Failures on individual rows are reported as [`UndoOutcome::Failed`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidyup::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// let report = UndoManager::undo(Path::new("sorted/_logs/sort-log-20250101-120000.csv"), true)?;
    /// println!("Restored {} files", report.changed());
    /// # Ok::<(), tidyup::error::OrganizeError>(())
    /// ```
    pub fn undo(log_path: &Path, apply: bool) -> OrganizeResult<UndoReport> {
        let contents = read_log(log_path)?;
        let mut report = UndoReport {
            log_path: log_path.to_path_buf(),
            applied: apply,
            ignored_rows: contents.ignored,
            ..Default::default()
        };

        for record in contents.records.into_iter().rev() {
            if record.status == Some(ItemStatus::Failed) {
                report.ignored_rows += 1;
                continue;
            }
            let outcome = Self::undo_record(&record, apply);
            match outcome {
                UndoOutcome::SkippedMissingDestination | UndoOutcome::SkippedSourceExists => {
                    tracing::warn!(
                        old_path = %record.old_path.display(),
                        new_path = %record.new_path.display(),
                        outcome = ?outcome,
                        "skipping undo row"
                    );
                }
                _ => tracing::debug!(
                    old_path = %record.old_path.display(),
                    new_path = %record.new_path.display(),
                    outcome = ?outcome,
                    "undo row"
                ),
            }
            report.entries.push(UndoEntry {
                old_path: record.old_path,
                new_path: record.new_path,
                outcome,
            });
        }

        tracing::info!(
            log = %log_path.display(),
            changed = report.changed(),
            skipped = report.skipped(),
            failed = report.failed(),
            apply,
            "undo finished"
        );
        Ok(report)
    }

    fn undo_record(record: &LogRecord, apply: bool) -> UndoOutcome {
        if fs::symlink_metadata(&record.new_path).is_err() {
            return UndoOutcome::SkippedMissingDestination;
        }
        if fs::symlink_metadata(&record.old_path).is_ok() {
            return UndoOutcome::SkippedSourceExists;
        }
        if !apply {
            return UndoOutcome::WouldRestore;
        }

        if let Some(parent) = record.old_path.parent()
            && let Err(err) = fs::create_dir_all(parent)
        {
            return UndoOutcome::Failed(format!(
                "cannot create directory {}: {err}",
                parent.display()
            ));
        }
        match move_path(&record.new_path, &record.old_path) {
            Ok(()) => UndoOutcome::Restored,
            Err(err) => {
                tracing::warn!(path = %record.new_path.display(), error = %err, "undo move failed");
                UndoOutcome::Failed(err.to_string())
            }
        }
    }
}
