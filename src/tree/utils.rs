//! Shared helpers for walking and pruning module trees

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IoResultExt, Result};

/// Directory names never descended into at any depth: VCS metadata and
/// dependency caches.
pub const DENIED_DIR_NAMES: &[&str] = &[".git", ".svn", ".hg", ".gradle", "node_modules"];

/// Build output, only skipped directly below the module root.
pub const BUILD_OUTPUT_DIRS: &[&str] = &["target", "bin", "dist"];

/// Module-relative directories holding vendored third-party code.
pub const DENIED_RELATIVE_DIRS: &[&str] = &["src/main/js/lib", "src/main/resources/WebContent/res/lib"];

/// Check if a directory should be skipped, by name or by relative location.
pub fn is_denied_dir(path: &Path, root: &Path) -> bool {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    if DENIED_DIR_NAMES.contains(&name.as_ref()) {
        return true;
    }
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    if rel.parent() == Some(Path::new("")) && BUILD_OUTPUT_DIRS.contains(&name.as_ref()) {
        return true;
    }
    DENIED_RELATIVE_DIRS.iter().any(|d| rel.ends_with(d))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Remove every directory below `root` that is (or becomes) empty.
///
/// Children are handled before their parent so a chain of empty directories
/// goes away in one pass. Hidden and denied directories are left alone and
/// count as content. `root` itself is never removed.
pub fn prune_empty_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    if root.is_dir() {
        prune_dir(root, root, &mut removed)?;
    }
    Ok(removed)
}

/// Returns true if `dir` was removed.
fn prune_dir(dir: &Path, root: &Path, removed: &mut Vec<PathBuf>) -> Result<bool> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .at(dir)?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut empty = true;
    for entry in entries {
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            empty = false;
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) || is_denied_dir(&path, root) {
            empty = false;
            continue;
        }
        if !prune_dir(&path, root, removed)? {
            empty = false;
        }
    }

    if !empty || dir == root {
        return Ok(false);
    }
    match fs::remove_dir(dir) {
        Ok(()) => {
            debug!(dir = %dir.display(), "removed empty directory");
            removed.push(dir.to_path_buf());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e).at(dir),
    }
}

/// Create the parent directories of `path`.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    Ok(())
}

/// Move a file, refusing to overwrite. Missing sources are already moved.
pub fn move_file(from: &Path, to: &Path) -> Result<bool> {
    if !from.exists() {
        return Ok(false);
    }
    if to.exists() {
        return Err(crate::error::MigrationError::conflict(from, to));
    }
    ensure_parent(to)?;
    fs::rename(from, to).at(from)?;
    Ok(true)
}

/// Delete a file; a missing file counts as already deleted.
pub fn delete_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).at(path),
    }
}
