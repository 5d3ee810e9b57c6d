//! CSV audit logs.
//!
//! Every apply run writes one log. The header goes out before the first move
//! and each row is flushed to disk as soon as its move has been attempted, so
//! an interrupted run leaves a log that covers everything done so far.
//!
//! Organizer log columns: `category,old_path,new_path,status,error`.
//! Renamer log columns: `old_path,new_path,timestamp_ms,source,status,error`.
//! A renamer dry run writes a plan file with the first four renamer columns.

use crate::collision::{self, ClaimSet};
use crate::error::{OrganizeError, OrganizeResult};
use crate::plan::{Label, Plan, PlanItem};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Column layout of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSchema {
    Organize,
    Rename,
    /// Dry-run rename plan; no outcome columns.
    RenamePlan,
}

impl LogSchema {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            LogSchema::Organize => &["category", "old_path", "new_path", "status", "error"],
            LogSchema::Rename => &[
                "old_path",
                "new_path",
                "timestamp_ms",
                "source",
                "status",
                "error",
            ],
            LogSchema::RenamePlan => &["old_path", "new_path", "timestamp_ms", "source"],
        }
    }
}

/// Outcome of one attempted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Moved,
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Moved => "moved",
            ItemStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "moved" => Some(ItemStatus::Moved),
            "failed" => Some(ItemStatus::Failed),
            _ => None,
        }
    }
}

/// Appends rows to a log, one durable write per row.
pub struct AuditLogWriter {
    path: PathBuf,
    schema: LogSchema,
    writer: Writer<File>,
}

impl AuditLogWriter {
    /// Creates a new log at `path` and writes its header.
    ///
    /// Missing parent directories are created. An existing file is never
    /// overwritten: the log goes to the first free `_001`, `_002`, ...
    /// variant instead, available through [`AuditLogWriter::path`].
    pub fn create(path: &Path, schema: LogSchema) -> OrganizeResult<Self> {
        let path = collision::resolve(path, &ClaimSet::new());
        let io_error = |e: std::io::Error| OrganizeError::LogWrite {
            path: path.clone(),
            source: e.into(),
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(io_error)?;

        let mut log = Self {
            writer: WriterBuilder::new().has_headers(false).from_writer(file),
            path,
            schema,
        };
        log.write_record(schema.header().iter().copied())?;
        tracing::debug!(path = %log.path.display(), "created audit log");
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records the outcome of one item.
    ///
    /// `destination` is where the item actually went (or was headed), which
    /// can differ from the planned destination after an apply-time re-resolve.
    pub fn append(
        &mut self,
        item: &PlanItem,
        destination: &Path,
        status: ItemStatus,
        error: &str,
    ) -> OrganizeResult<()> {
        let row = row_fields(self.schema, item, destination, Some((status, error)));
        self.write_record(row)
    }

    fn write_record<I, T>(&mut self, record: I) -> OrganizeResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let log_error = |source: csv::Error| OrganizeError::LogWrite {
            path: self.path.clone(),
            source,
        };
        self.writer.write_record(record).map_err(log_error)?;
        self.writer.flush().map_err(|e| log_error(e.into()))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|e| log_error(e.into()))
    }
}

fn row_fields(
    schema: LogSchema,
    item: &PlanItem,
    destination: &Path,
    outcome: Option<(ItemStatus, &str)>,
) -> Vec<String> {
    let old_path = item.source.to_string_lossy().into_owned();
    let new_path = destination.to_string_lossy().into_owned();
    let (timestamp_ms, origin) = match item.label {
        Label::Timestamp(stamp) => (stamp.millis.to_string(), stamp.origin.as_str().to_string()),
        Label::Category(_) => (String::new(), String::new()),
    };

    let mut row = match schema {
        LogSchema::Organize => vec![item.label.name().to_string(), old_path, new_path],
        LogSchema::Rename | LogSchema::RenamePlan => {
            vec![old_path, new_path, timestamp_ms, origin]
        }
    };
    if schema != LogSchema::RenamePlan {
        let (status, error) = outcome.unwrap_or((ItemStatus::Failed, ""));
        row.push(status.as_str().to_string());
        row.push(error.to_string());
    }
    row
}

/// Writes the renamer's dry-run plan file. Returns the path actually written.
pub fn write_plan_log(path: &Path, plan: &Plan) -> OrganizeResult<PathBuf> {
    let mut log = AuditLogWriter::create(path, LogSchema::RenamePlan)?;
    for item in &plan.items {
        let row = row_fields(LogSchema::RenamePlan, item, &item.destination, None);
        log.write_record(row)?;
    }
    Ok(log.path)
}

/// One row read back from a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Category for organizer logs, timestamp origin for rename logs.
    pub label: String,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    /// `None` when the log has no status column (a rename plan file).
    pub status: Option<ItemStatus>,
    pub error: String,
}

/// Rows of a log plus the number that could not be used.
#[derive(Debug, Clone, Default)]
pub struct LogContents {
    pub records: Vec<LogRecord>,
    /// Malformed rows, rows with empty paths, and rows with an unknown status.
    pub ignored: usize,
}

struct Columns {
    old_path: usize,
    new_path: usize,
    status: Option<usize>,
    label: Option<usize>,
    error: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Some(Self {
            old_path: find("old_path")?,
            new_path: find("new_path")?,
            status: find("status"),
            label: find("category").or_else(|| find("source")),
            error: find("error"),
        })
    }
}

/// Reads any of the log layouts this tool writes, detected by header.
pub fn read_log(path: &Path) -> OrganizeResult<LogContents> {
    if !path.is_file() {
        return Err(OrganizeError::LogNotFound(path.to_path_buf()));
    }
    let read_error = |source: csv::Error| OrganizeError::LogRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;
    let headers = reader.headers().map_err(read_error)?.clone();
    let columns = Columns::locate(&headers).ok_or_else(|| OrganizeError::InvalidLogFormat {
        path: path.to_path_buf(),
        reason: "header must contain old_path and new_path".to_string(),
    })?;

    let mut contents = LogContents::default();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(line = line + 2, error = %err, "ignoring unreadable log row");
                contents.ignored += 1;
                continue;
            }
        };
        let field = |index: usize| record.get(index).unwrap_or("").trim();
        // Paths are kept verbatim: file names may begin or end with spaces.
        let raw = |index: usize| record.get(index).unwrap_or("");

        let old_path = raw(columns.old_path);
        let new_path = raw(columns.new_path);
        if old_path.is_empty() || new_path.is_empty() {
            contents.ignored += 1;
            continue;
        }

        let status = match columns.status {
            Some(index) => match ItemStatus::parse(field(index)) {
                Some(status) => Some(status),
                None => {
                    tracing::warn!(line = line + 2, status = field(index), "ignoring log row with unknown status");
                    contents.ignored += 1;
                    continue;
                }
            },
            None => None,
        };

        contents.records.push(LogRecord {
            label: columns.label.map(|i| field(i).to_string()).unwrap_or_default(),
            old_path: PathBuf::from(old_path),
            new_path: PathBuf::from(new_path),
            status,
            error: columns.error.map(|i| field(i).to_string()).unwrap_or_default(),
        });
    }

    Ok(contents)
}
