//! Collision-free destination naming.
//!
//! A destination is free when nothing exists at it on disk and no other item
//! in the current batch has claimed it. Claims are compared case-insensitively
//! so a batch stays valid on case-insensitive filesystems.

use crate::file_category::split_base_ext;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Destinations already handed out within one batch.
#[derive(Debug, Default, Clone)]
pub struct ClaimSet {
    claimed: HashSet<String>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &Path) -> String {
        path.to_string_lossy().to_lowercase()
    }

    /// Records `path` as taken.
    pub fn claim(&mut self, path: &Path) {
        self.claimed.insert(Self::key(path));
    }

    /// Releases a previous claim.
    pub fn release(&mut self, path: &Path) {
        self.claimed.remove(&Self::key(path));
    }

    pub fn is_claimed(&self, path: &Path) -> bool {
        self.claimed.contains(&Self::key(path))
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Resolves a free destination for `desired` and claims it.
    pub fn claim_unique(&mut self, desired: &Path) -> PathBuf {
        let path = resolve(desired, self);
        self.claim(&path);
        path
    }
}

/// Builds `<stem>_<NNN><ext>` next to `path`, keeping compound extensions intact.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tidyup::collision::suffixed_path;
///
/// assert_eq!(
///     suffixed_path(Path::new("/out/b.tar.gz"), 2),
///     Path::new("/out/b_002.tar.gz")
/// );
/// ```
pub fn suffixed_path(path: &Path, n: u32) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = split_base_ext(&name);
    path.with_file_name(format!("{stem}_{n:03}{ext}"))
}

/// Returns `desired` if it is free, otherwise the first free `_001`, `_002`, ... variant.
///
/// Any directory entry counts as occupied, including a dangling symlink.
pub fn resolve(desired: &Path, claimed: &ClaimSet) -> PathBuf {
    resolve_with(desired, claimed, occupied_on_disk)
}

/// Like [`resolve`], but `current` (the item's own location) never counts as
/// occupied on disk, so an item already sitting at a free target resolves to
/// itself.
pub fn resolve_for(desired: &Path, claimed: &ClaimSet, current: &Path) -> PathBuf {
    resolve_with(desired, claimed, |candidate| {
        candidate != current && occupied_on_disk(candidate)
    })
}

fn occupied_on_disk(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn resolve_with<F>(desired: &Path, claimed: &ClaimSet, occupied: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    if !claimed.is_claimed(desired) && !occupied(desired) {
        return desired.to_path_buf();
    }

    let mut n = 1;
    loop {
        let candidate = suffixed_path(desired, n);
        if !claimed.is_claimed(&candidate) && !occupied(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
