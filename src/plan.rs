//! Plan construction.
//!
//! A [`Plan`] is the complete, ordered list of moves a run would make. It is
//! built without mutating anything: the only I/O is directory listing and
//! metadata reads. Every destination in a plan is absent on disk at planning
//! time and distinct from every other destination in the same plan.

use crate::audit_log::LogSchema;
use crate::collision::{self, ClaimSet};
use crate::config::CompiledFilters;
use crate::config::{ConfigError, DEFAULT_RENAME_EXTENSIONS, DEFAULT_RESULT_DIR_NAME};
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::{Category, FileMapper};
use crate::scanner::{self, ScanOptions};
use crate::timestamp::{NameFormat, Timestamp, TimestampSource, format_stamp};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Name of the log folder inside the organizer's result directory.
pub const LOG_DIR_NAME: &str = "_logs";

/// Why an item is in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Organizer: the category folder the item goes to.
    Category(Category),
    /// Renamer: the timestamp the new name encodes.
    Timestamp(Timestamp),
}

impl Label {
    /// Short text used for counts and previews.
    pub fn name(&self) -> &'static str {
        match self {
            Label::Category(category) => category.dir_name(),
            Label::Timestamp(stamp) => stamp.origin.as_str(),
        }
    }
}

/// One planned move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub label: Label,
}

/// What to do with items no category claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UnclassifiedPolicy {
    /// Move them into the `other` category.
    #[default]
    Move,
    /// List them in the plan and leave them in place.
    Report,
}

impl FromStr for UnclassifiedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "report" => Ok(Self::Report),
            _ => Err(ConfigError::ConfigInvalid(format!(
                "unclassified must be 'move' or 'report', got '{s}'"
            ))),
        }
    }
}

/// Options for [`build_organize_plan`].
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub result_dir_name: String,
    pub recursive: bool,
    /// Keep each item's path relative to the root under its category folder.
    pub keep_structure: bool,
    pub include_packages: bool,
    pub include_app: bool,
    pub unclassified: UnclassifiedPolicy,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            result_dir_name: DEFAULT_RESULT_DIR_NAME.to_string(),
            recursive: false,
            keep_structure: false,
            include_packages: false,
            include_app: false,
            unclassified: UnclassifiedPolicy::Move,
        }
    }
}

/// Options for [`build_rename_plan`].
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub recursive: bool,
    /// Suffixes to pick up; empty means the default image set.
    pub extensions: Vec<String>,
    pub format: NameFormat,
    /// Prefix new names with the parent folder's name.
    pub folder_prefix: bool,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: Vec::new(),
            format: NameFormat::DatetimeMs,
            folder_prefix: true,
        }
    }
}

/// Which tool produced a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanKind {
    Organize { result_dir: PathBuf },
    Rename,
}

/// The full set of moves for one run, plus what the preview needs.
#[derive(Debug, Clone)]
pub struct Plan {
    pub root: PathBuf,
    pub kind: PlanKind,
    pub items: Vec<PlanItem>,
    /// Directories apply would create, sorted case-insensitively.
    pub directories: Vec<PathBuf>,
    /// Item count per label name.
    pub counts: BTreeMap<String, usize>,
    /// Items left out because no category claims them.
    pub unclassified: Vec<PathBuf>,
    /// Items already at their target.
    pub unchanged: usize,
}

impl Plan {
    fn new(root: PathBuf, kind: PlanKind) -> Self {
        Self {
            root,
            kind,
            items: Vec::new(),
            directories: Vec::new(),
            counts: BTreeMap::new(),
            unclassified: Vec::new(),
            unchanged: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Column layout of this plan's apply log.
    pub fn schema(&self) -> LogSchema {
        match self.kind {
            PlanKind::Organize { .. } => LogSchema::Organize,
            PlanKind::Rename => LogSchema::Rename,
        }
    }

    /// Where the apply log goes unless the caller picks a path.
    ///
    /// `stamp` is the run's timestamp, e.g. `20250101-120000`.
    pub fn default_log_path(&self, stamp: &str) -> PathBuf {
        match &self.kind {
            PlanKind::Organize { result_dir } => result_dir
                .join(LOG_DIR_NAME)
                .join(format!("sort-log-{stamp}.csv")),
            PlanKind::Rename => self.root.join(format!("rename-log-{stamp}.csv")),
        }
    }

    fn count(&mut self, label: &Label) {
        *self.counts.entry(label.name().to_string()).or_insert(0) += 1;
    }
}

/// Checks that `root` is an existing directory and returns its canonical form.
pub fn validate_root(root: &Path) -> OrganizeResult<PathBuf> {
    let metadata =
        fs::metadata(root).map_err(|_| OrganizeError::RootNotFound(root.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(OrganizeError::NotADirectory(root.to_path_buf()));
    }
    fs::canonicalize(root).map_err(|_| OrganizeError::RootNotFound(root.to_path_buf()))
}

fn validate_result_dir_name(name: &str) -> OrganizeResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(OrganizeError::InvalidResultDirName(name.to_string())),
    }
}

/// Builds the organizer plan for `root`.
///
/// Candidates are enumerated in case-insensitive path order and assigned
/// destinations in that order, so suffixes are reproducible. The returned
/// items are ordered by category, then by source path.
pub fn build_organize_plan(
    root: &Path,
    options: &OrganizeOptions,
    filters: &CompiledFilters,
) -> OrganizeResult<Plan> {
    let root = validate_root(root)?;
    validate_result_dir_name(&options.result_dir_name)?;
    let result_dir = root.join(&options.result_dir_name);

    let scan = ScanOptions {
        recursive: options.recursive,
        excluded_dir: Some(result_dir.clone()),
        include_packages: options.include_packages,
        include_app: options.include_app,
    };
    let candidates = scanner::enumerate_root(&root, &scan, filters)?;

    let mapper = FileMapper::standard();
    let mut plan = Plan::new(
        root.clone(),
        PlanKind::Organize {
            result_dir: result_dir.clone(),
        },
    );
    let mut claims = ClaimSet::new();

    for source in candidates {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let category = match (mapper.classify(&source), options.unclassified) {
            (Some(category), _) => category,
            (None, UnclassifiedPolicy::Move) => Category::Other,
            (None, UnclassifiedPolicy::Report) => {
                plan.unclassified.push(source);
                continue;
            }
        };

        let mut desired = result_dir.join(category.dir_name());
        if options.keep_structure
            && let Some(relative_parent) = source.parent().and_then(|p| p.strip_prefix(&root).ok())
        {
            desired.push(relative_parent);
        }
        desired.push(file_name);

        let destination = claims.claim_unique(&desired);
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            category = category.dir_name(),
            "planned move"
        );
        let label = Label::Category(category);
        plan.count(&label);
        plan.items.push(PlanItem {
            source,
            destination,
            label,
        });
    }

    plan.items.sort_by_cached_key(|item| {
        let category = match item.label {
            Label::Category(category) => category,
            Label::Timestamp(_) => Category::Other,
        };
        (
            category.dir_name(),
            item.source.to_string_lossy().to_lowercase(),
        )
    });

    if !plan.items.is_empty() {
        let mut directories: HashSet<PathBuf> = HashSet::new();
        directories.insert(result_dir.clone());
        directories.insert(result_dir.join(LOG_DIR_NAME));
        for item in &plan.items {
            if let Some(parent) = item.destination.parent() {
                let mut dir = parent;
                // every missing ancestor up to the result directory
                while dir.starts_with(&result_dir) && directories.insert(dir.to_path_buf()) {
                    match dir.parent() {
                        Some(up) => dir = up,
                        None => break,
                    }
                }
            }
        }
        let mut directories: Vec<PathBuf> =
            directories.into_iter().filter(|d| !d.exists()).collect();
        scanner::sort_case_insensitive(&mut directories);
        plan.directories = directories;
    }

    Ok(plan)
}

/// Normalizes user-supplied suffixes: trimmed, lowercased, without the dot.
///
/// Falls back to [`DEFAULT_RENAME_EXTENSIONS`] when nothing usable is given.
pub fn normalize_extensions(extensions: &[String]) -> HashSet<String> {
    let normalized: HashSet<String> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    if normalized.is_empty() {
        DEFAULT_RENAME_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    } else {
        normalized
    }
}

fn rename_target(source: &Path, stamp: &Timestamp, options: &RenameOptions) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    let prefix = if options.folder_prefix {
        // a leading dot would make every renamed file hidden
        parent
            .file_name()
            .map(|n| n.to_string_lossy().trim_start_matches('.').to_string())
    } else {
        None
    };
    let base = format_stamp(stamp.millis, options.format, prefix.as_deref());
    let name = match source.extension() {
        Some(ext) => format!("{base}.{}", ext.to_string_lossy()),
        None => base,
    };
    parent.join(name)
}

/// Builds the renamer plan for `root`.
///
/// Items are sorted by `(timestamp, file name)` before names are assigned, so
/// equal timestamps get `_001`, `_002`, ... in a stable order. A file already
/// carrying its target name keeps it unless an earlier item in the batch
/// claimed that name; either way items whose destination equals their current
/// path are left out of the plan.
pub fn build_rename_plan(
    root: &Path,
    options: &RenameOptions,
    time_source: &dyn TimestampSource,
    filters: &CompiledFilters,
) -> OrganizeResult<Plan> {
    let root = validate_root(root)?;
    let extensions = normalize_extensions(&options.extensions);

    let scan = ScanOptions {
        recursive: options.recursive,
        ..Default::default()
    };
    let mut stamped = Vec::new();
    for source in scanner::enumerate_root(&root, &scan, filters)? {
        let matches = source
            .extension()
            .map(|e| extensions.contains(&e.to_string_lossy().to_lowercase()))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let stamp = time_source
            .timestamp(&source)
            .map_err(|source_error| OrganizeError::Timestamp {
                path: source.clone(),
                source: source_error,
            })?;
        stamped.push((source, stamp));
    }

    stamped.sort_by_cached_key(|(source, stamp)| {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        (stamp.millis, name, source.clone())
    });

    let targets: Vec<PathBuf> = stamped
        .iter()
        .map(|(source, stamp)| rename_target(source, stamp, options))
        .collect();

    // Files already sitting at their exact target keep it.
    let mut claims = ClaimSet::new();
    let mut settled = vec![false; stamped.len()];
    for (i, ((source, _), target)) in stamped.iter().zip(&targets).enumerate() {
        if source == target && !claims.is_claimed(target) {
            claims.claim(target);
            settled[i] = true;
        }
    }

    let mut plan = Plan::new(root, PlanKind::Rename);
    for (((source, stamp), target), settled) in stamped.into_iter().zip(targets).zip(settled) {
        if settled {
            plan.unchanged += 1;
            continue;
        }
        let destination = collision::resolve_for(&target, &claims, &source);
        claims.claim(&destination);
        if destination == source {
            plan.unchanged += 1;
            continue;
        }
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            millis = stamp.millis,
            origin = stamp.origin.as_str(),
            "planned rename"
        );
        let label = Label::Timestamp(stamp);
        plan.count(&label);
        plan.items.push(PlanItem {
            source,
            destination,
            label,
        });
    }

    Ok(plan)
}
