//! TreeWalker - ordered, filtered walk over a module directory

use std::io;
use std::path::PathBuf;

use ignore::WalkBuilder;
use tracing::debug;

use crate::error::Result;
use crate::path_info::PathInfo;

use super::filter::PathFilter;
use super::utils::is_denied_dir;

/// Depth-first walk yielding regular files in file-name order.
///
/// Denied directories are never entered. A file is handed out when it passes
/// the include filter (if any) and no exclude filter matches it.
pub struct TreeWalker {
    root: PathBuf,
    include: Option<Box<dyn PathFilter>>,
    excludes: Vec<Box<dyn PathFilter>>,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: None,
            excludes: Vec::new(),
        }
    }

    pub fn with_include(mut self, filter: impl PathFilter + 'static) -> Self {
        self.include = Some(Box::new(filter));
        self
    }

    /// Set the include filter from an optional, already boxed filter.
    pub fn with_optional_include(mut self, filter: Option<Box<dyn PathFilter>>) -> Self {
        self.include = filter;
        self
    }

    pub fn with_exclude(mut self, filter: impl PathFilter + 'static) -> Self {
        self.excludes.push(Box::new(filter));
        self
    }

    /// Check a path against the include and exclude filters.
    pub fn accepts(&self, info: &PathInfo) -> bool {
        if let Some(include) = &self.include {
            if !include.test(info) {
                return false;
            }
        }
        !self.excludes.iter().any(|f| f.test(info))
    }

    /// Collect every accepted file.
    pub fn walk(&self) -> Result<Vec<PathInfo>> {
        let mut files = Vec::new();
        self.visit(|info| {
            files.push(info);
            Ok(())
        })?;
        Ok(files)
    }

    /// Hand every accepted file to `visitor`, stopping at its first error.
    ///
    /// Paths that disappear while walking are treated as already absent.
    pub fn visit<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(PathInfo) -> Result<()>,
    {
        let root = self.root.clone();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir && entry.depth() > 0 && is_denied_dir(entry.path(), &root))
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_not_found(&err) => {
                    debug!(error = %err, "skipping vanished path");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let info = PathInfo::with_root(entry.path(), &self.root);
            if self.accepts(&info) {
                visitor(info)?;
            }
        }
        Ok(())
    }
}

fn is_not_found(err: &ignore::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::filter::{one_of, under};
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for f in files {
            let p = dir.path().join(f);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, f).unwrap();
        }
        dir
    }

    fn rel(infos: &[PathInfo]) -> Vec<String> {
        infos
            .iter()
            .map(|i| i.module_relative().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_walk_is_sorted_and_skips_denied() {
        let dir = tree(&[
            "b.js",
            "a/z.js",
            "a/c.js",
            "node_modules/dep/index.js",
            ".git/config",
            "src/main/js/lib/jquery.js",
            "src/main/js/scout/x.js",
        ]);
        let files = TreeWalker::new(dir.path()).walk().unwrap();
        assert_eq!(rel(&files), vec!["a/c.js", "a/z.js", "b.js", "src/main/js/scout/x.js"]);
    }

    #[test]
    fn test_include_then_exclude() {
        let dir = tree(&["src/main/js/a.js", "src/main/js/b.js", "src/main/js/c.less", "x.js"]);
        let files = TreeWalker::new(dir.path())
            .with_include(under("src/main/js"))
            .with_exclude(one_of(["src/main/js/b.js"]))
            .with_exclude(|i: &PathInfo| !i.has_extension("js"))
            .walk()
            .unwrap();
        assert_eq!(rel(&files), vec!["src/main/js/a.js"]);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let files = TreeWalker::new(dir.path().join("missing")).walk().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_visitor_error_stops_walk() {
        let dir = tree(&["a.js", "b.js"]);
        let mut seen = 0;
        let result = TreeWalker::new(dir.path()).visit(|_| {
            seen += 1;
            Err(crate::error::MigrationError::Configuration("stop".into()))
        });
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }
}
