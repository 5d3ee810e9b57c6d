//! Timestamp acquisition and timestamp-based file names.
//!
//! The renamer asks a [`TimestampSource`] for a `(millis, origin)` pair per
//! file. Two implementations ship: [`PlatformTimeSource`], which tries the
//! macOS Spotlight "date added" attribute before falling back to filesystem
//! times, and [`StatTimeSource`], which only uses `stat` data.

use crate::error::OrganizeError;
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Where a timestamp came from. Recorded per item in the rename log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StampOrigin {
    DateAdded,
    Birthtime,
    Mtime,
}

impl StampOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            StampOrigin::DateAdded => "date-added",
            StampOrigin::Birthtime => "birthtime",
            StampOrigin::Mtime => "mtime",
        }
    }
}

impl fmt::Display for StampOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamp in epoch milliseconds with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub millis: i64,
    pub origin: StampOrigin,
}

impl Timestamp {
    pub fn new(millis: i64, origin: StampOrigin) -> Self {
        Self { millis, origin }
    }
}

/// Supplies a timestamp for a file.
pub trait TimestampSource {
    fn timestamp(&self, path: &Path) -> io::Result<Timestamp>;
}

/// Which timestamp the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TimeSourceKind {
    /// Date added, then birthtime, then mtime.
    #[default]
    Auto,
    /// Same chain as `auto`; kept as an explicit spelling.
    DateAdded,
    /// Birthtime, then mtime.
    Birthtime,
    /// Modification time only.
    Mtime,
}

impl FromStr for TimeSourceKind {
    type Err = OrganizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "date-added" => Ok(Self::DateAdded),
            "birthtime" => Ok(Self::Birthtime),
            "mtime" => Ok(Self::Mtime),
            _ => Err(OrganizeError::UnsupportedTimeSource(s.to_string())),
        }
    }
}

/// Returns the source implementing `kind`.
pub fn time_source_for(kind: TimeSourceKind) -> Box<dyn TimestampSource> {
    match kind {
        TimeSourceKind::Auto | TimeSourceKind::DateAdded => Box::new(PlatformTimeSource),
        TimeSourceKind::Birthtime => Box::new(StatTimeSource { birthtime: true }),
        TimeSourceKind::Mtime => Box::new(StatTimeSource { birthtime: false }),
    }
}

/// Filesystem-only timestamps.
#[derive(Debug, Clone, Copy)]
pub struct StatTimeSource {
    /// Prefer birthtime when the platform reports one.
    pub birthtime: bool,
}

impl TimestampSource for StatTimeSource {
    fn timestamp(&self, path: &Path) -> io::Result<Timestamp> {
        let metadata = fs::metadata(path)?;
        if self.birthtime
            && let Ok(created) = metadata.created()
        {
            return Ok(Timestamp::new(system_time_millis(created), StampOrigin::Birthtime));
        }
        Ok(Timestamp::new(
            system_time_millis(metadata.modified()?),
            StampOrigin::Mtime,
        ))
    }
}

/// Spotlight "date added" with fallback to [`StatTimeSource`].
#[derive(Debug, Clone, Copy)]
pub struct PlatformTimeSource;

impl TimestampSource for PlatformTimeSource {
    fn timestamp(&self, path: &Path) -> io::Result<Timestamp> {
        if let Some(millis) = date_added_millis(path) {
            return Ok(Timestamp::new(millis, StampOrigin::DateAdded));
        }
        StatTimeSource { birthtime: true }.timestamp(path)
    }
}

#[cfg(target_os = "macos")]
fn date_added_millis(path: &Path) -> Option<i64> {
    let output = std::process::Command::new("mdls")
        .args(["-name", "kMDItemDateAdded", "-raw"])
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_mdls_date(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(not(target_os = "macos"))]
fn date_added_millis(_path: &Path) -> Option<i64> {
    None
}

/// Parses `mdls -raw` date output such as `2025-12-16 02:23:45 +0000`.
///
/// Returns `None` for `(null)` and anything unparseable.
pub fn parse_mdls_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "(null)" {
        return None;
    }
    ["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f %:z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.timestamp_millis())
}

/// Converts a `SystemTime` to epoch milliseconds, rounding to the nearest ms.
pub fn system_time_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from((after.as_micros() + 500) / 1000).unwrap_or(i64::MAX),
        Err(before) => i64::try_from((before.duration().as_micros() + 500) / 1000)
            .map_or(i64::MIN, |millis| -millis),
    }
}

/// How a timestamp is encoded into a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum NameFormat {
    /// Local time as `YYYYMMDDHHMMSSmmm`.
    #[default]
    DatetimeMs,
    /// Epoch milliseconds, zero-padded to 13 digits.
    EpochMs,
}

impl FromStr for NameFormat {
    type Err = OrganizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "datetime-ms" => Ok(Self::DatetimeMs),
            "epoch-ms" => Ok(Self::EpochMs),
            _ => Err(OrganizeError::UnsupportedNameFormat(s.to_string())),
        }
    }
}

/// Encodes `millis` as a sortable stem, optionally prefixed with `prefix_`.
///
/// # Examples
///
/// ```
/// use tidyup::timestamp::{format_stamp, NameFormat};
///
/// assert_eq!(format_stamp(1_700_000_000_123, NameFormat::EpochMs, None), "1700000000123");
/// assert_eq!(format_stamp(42, NameFormat::EpochMs, Some("trip")), "trip_0000000000042");
/// ```
pub fn format_stamp(millis: i64, format: NameFormat, prefix: Option<&str>) -> String {
    let stamp = match format {
        NameFormat::EpochMs => format!("{millis:013}"),
        NameFormat::DatetimeMs => match Local.timestamp_millis_opt(millis).earliest() {
            Some(dt) => format!(
                "{}{:03}",
                dt.format("%Y%m%d%H%M%S"),
                millis.rem_euclid(1000)
            ),
            None => format!("{millis:013}"),
        },
    };
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}_{stamp}"),
        _ => stamp,
    }
}
