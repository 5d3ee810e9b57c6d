//! Candidate enumeration.
//!
//! Walks a root directory (direct children only, or recursively) and yields
//! the entries a plan may act on. Hidden entries and the excluded subtree
//! (the organizer's result directory) are pruned before descent, so nothing
//! under them is ever visited.

use crate::config::CompiledFilters;
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_category::{APP_EXTENSION, PACKAGE_EXTENSIONS, extension_token};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Controls which entries [`enumerate_root`] yields.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Walk the whole tree instead of direct children.
    pub recursive: bool,
    /// Subtree that is never entered or yielded.
    pub excluded_dir: Option<PathBuf>,
    /// Yield `.pages` / `.numbers` / `.key` package directories as items.
    pub include_packages: bool,
    /// Also yield `.app` bundles. Only honored together with `include_packages`.
    pub include_app: bool,
}

/// Returns true for names starting with the hidden-file marker.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Returns true if `path` is a package-style directory name (by suffix only).
pub fn is_package_name(path: &Path) -> bool {
    let ext = extension_token(path);
    PACKAGE_EXTENSIONS.contains(&ext.as_str()) || ext == APP_EXTENSION
}

fn package_allowed(path: &Path, options: &ScanOptions) -> bool {
    if !options.include_packages {
        return false;
    }
    let ext = extension_token(path);
    PACKAGE_EXTENSIONS.contains(&ext.as_str()) || (options.include_app && ext == APP_EXTENSION)
}

/// Lists candidate paths under `root`, sorted case-insensitively by path string.
///
/// Regular files (and symlinks to files) are yielded unless filtered out.
/// Package directories are never descended into; they are yielded only when
/// the options allow them. Unreadable subdirectories are logged and skipped,
/// an unreadable root is an error.
pub fn enumerate_root(
    root: &Path,
    options: &ScanOptions,
    filters: &CompiledFilters,
) -> OrganizeResult<Vec<PathBuf>> {
    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let excluded = options.excluded_dir.as_deref();

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| {
            let path = entry.path();
            !is_hidden(path) && excluded.is_none_or(|dir| !path.starts_with(dir))
        });

    let mut candidates = Vec::new();
    while let Some(next) = walker.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(OrganizeError::Scan {
                    path: root.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);

        if entry.file_type().is_dir() {
            if is_package_name(path) {
                walker.skip_current_dir();
                if package_allowed(path, options) && filters.should_include(relative) {
                    candidates.push(path.to_path_buf());
                }
            }
            continue;
        }

        let is_file = entry.file_type().is_file()
            || (entry.file_type().is_symlink() && path.is_file());
        if is_file && filters.should_include(relative) {
            candidates.push(path.to_path_buf());
        }
    }

    sort_case_insensitive(&mut candidates);
    tracing::debug!(root = %root.display(), count = candidates.len(), "enumerated candidates");
    Ok(candidates)
}

/// Sorts paths by their lowercased string form, breaking ties by the exact form.
pub fn sort_case_insensitive(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| {
        let s = p.to_string_lossy().into_owned();
        (s.to_lowercase(), s)
    });
}
