//! A file path together with its location relative to a module root

use std::path::{Path, PathBuf};

/// Immutable path value used for filtering and destination mapping.
///
/// The relative part depends on the root it was built against: Phase 1
/// builds these against the source root, Phase 2 against the target root,
/// so the two are never interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathInfo {
    path: PathBuf,
    module_relative: Option<PathBuf>,
}

impl PathInfo {
    /// A path with no module root.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            module_relative: None,
        }
    }

    /// A path relative to `root`. Paths outside `root` get no relative part.
    pub fn with_root(path: impl Into<PathBuf>, root: &Path) -> Self {
        let path = path.into();
        let module_relative = path.strip_prefix(root).ok().map(Path::to_path_buf);
        Self {
            path,
            module_relative,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn module_relative(&self) -> Option<&Path> {
        self.module_relative.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Lowercased extension, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
    }

    /// True if the module-relative path lies below `prefix` (component-wise).
    pub fn is_under(&self, prefix: impl AsRef<Path>) -> bool {
        self.module_relative
            .as_deref()
            .is_some_and(|rel| rel.starts_with(prefix.as_ref()))
    }
}
