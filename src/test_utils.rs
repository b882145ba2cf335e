//! Test utilities for building temporary module trees.
//!
//! This module is only compiled for tests and benchmarks.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::ModuleConfig;

/// A temporary directory holding a source module and room for its target.
///
/// Files are added relative to the source module root. Everything is removed
/// when the tree is dropped.
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("source")).expect("Failed to create source dir");
        Self { dir }
    }

    /// Root of the whole temporary directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn target(&self) -> PathBuf {
        self.dir.path().join("target-module")
    }

    /// Add a file below the source root, creating parent directories.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        write(&self.source().join(path), content.as_bytes())
    }

    pub fn add_bytes(&self, path: &str, content: &[u8]) -> PathBuf {
        write(&self.source().join(path), content)
    }

    /// Add a file anywhere below the temporary root, e.g. a library API.
    pub fn add_outside(&self, path: &str, content: &str) -> PathBuf {
        write(&self.dir.path().join(path), content.as_bytes())
    }

    /// A configuration migrating `source` into `target` for `namespace`.
    pub fn config(&self, namespace: &str) -> ModuleConfig {
        ModuleConfig::new(self.source(), self.target(), namespace)
    }

    /// Content of a target file, if it exists.
    pub fn read_target(&self, path: &str) -> Option<String> {
        fs::read_to_string(self.target().join(path)).ok()
    }

    pub fn target_exists(&self, path: &str) -> bool {
        self.target().join(path).exists()
    }

    /// Sorted target-relative paths of every file in the target tree.
    pub fn target_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect(&self.target(), &self.target(), &mut files);
        files.sort();
        files
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

fn write(path: &Path, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(path, content).expect("Failed to write file");
    path.to_path_buf()
}

fn collect(dir: &Path, root: &Path, files: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, root, files);
        } else if let Ok(rel) = path.strip_prefix(root) {
            files.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}
