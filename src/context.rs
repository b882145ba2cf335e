//! Per-run registry of working copies and task-shared state

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ModuleConfig;
use crate::error::Result;
use crate::library::LibraryApi;
use crate::recognize::JsFile;
use crate::working_copy::WorkingCopy;

/// A per-file problem that does not abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub path: PathBuf,
    pub message: String,
}

struct CachedJsFile {
    revision: u64,
    file: Rc<JsFile>,
}

/// Shared state of one migration run.
///
/// Owns exactly one `WorkingCopy` per distinct path. Derived caches are keyed
/// by path and stamped with the working copy revision they were built from,
/// so any real edit invalidates them.
pub struct MigrationContext<'a> {
    config: &'a ModuleConfig,
    working_copies: BTreeMap<PathBuf, WorkingCopy>,
    js_files: HashMap<PathBuf, CachedJsFile>,
    imports: BTreeMap<PathBuf, BTreeMap<String, BTreeSet<String>>>,
    libraries: Vec<LibraryApi>,
    deleted: HashSet<PathBuf>,
    warnings: Vec<Warning>,
}

impl<'a> MigrationContext<'a> {
    pub fn new(config: &'a ModuleConfig) -> Self {
        Self {
            config,
            working_copies: BTreeMap::new(),
            js_files: HashMap::new(),
            imports: BTreeMap::new(),
            libraries: Vec::new(),
            deleted: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn config(&self) -> &'a ModuleConfig {
        self.config
    }

    /// The working copy for `path`, created on first access.
    pub fn working_copy(&mut self, path: &Path) -> &mut WorkingCopy {
        self.working_copies
            .entry(path.to_path_buf())
            .or_insert_with(|| WorkingCopy::new(path))
    }

    pub fn existing_working_copy(&mut self, path: &Path) -> Option<&mut WorkingCopy> {
        self.working_copies.get_mut(path)
    }

    /// Paths of all working copies, in path order.
    pub fn working_copy_paths(&self) -> Vec<PathBuf> {
        self.working_copies.keys().cloned().collect()
    }

    pub fn dirty_paths(&self) -> Vec<PathBuf> {
        self.working_copies
            .iter()
            .filter(|(_, wc)| wc.is_dirty())
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Shorthand for editing a file's content through its working copy.
    pub fn set_source(&mut self, path: &Path, text: impl Into<String>) -> Result<bool> {
        self.working_copy(path).set_source(text)
    }

    /// Drop everything known about `path`, e.g. after it was moved.
    pub fn forget(&mut self, path: &Path) {
        self.working_copies.remove(path);
        self.js_files.remove(path);
        self.imports.remove(path);
    }

    /// Write every dirty copy back to its own location.
    pub fn store_all(&mut self) -> Result<usize> {
        let mut stored = 0;
        for wc in self.working_copies.values_mut() {
            if wc.store_source()? {
                stored += 1;
            }
        }
        if stored > 0 {
            debug!(count = stored, "flushed working copies in place");
        }
        Ok(stored)
    }

    /// Recognized JS structure of `path`, parsed from its current content.
    pub fn js_file(&mut self, path: &Path) -> Result<Rc<JsFile>> {
        let namespace = self.config.namespace.clone();
        let wc = self.working_copy(path);
        let revision = wc.revision();
        if let Some(cached) = self.js_files.get(path) {
            if cached.revision == revision {
                return Ok(Rc::clone(&cached.file));
            }
        }
        let wc = self.working_copy(path);
        let recognized = JsFile::recognize(wc.source()?, &namespace);
        for message in recognized.warnings {
            self.warn(path, message);
        }
        let file = Rc::new(recognized.file);
        self.js_files.insert(
            path.to_path_buf(),
            CachedJsFile {
                revision,
                file: Rc::clone(&file),
            },
        );
        Ok(file)
    }

    pub fn is_recognized(&self, path: &Path) -> bool {
        self.js_files.contains_key(path)
    }

    /// Recognized files in path order.
    pub fn recognized_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.js_files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Queue `import {name} from 'library'` for `path`.
    pub fn add_import(&mut self, path: &Path, library: &str, name: &str) {
        self.imports
            .entry(path.to_path_buf())
            .or_default()
            .entry(library.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// Queued imports of `path`, grouped by library.
    pub fn take_imports(&mut self, path: &Path) -> Option<BTreeMap<String, BTreeSet<String>>> {
        self.imports.remove(path)
    }

    pub fn add_library(&mut self, library: LibraryApi) {
        self.libraries.push(library);
    }

    /// APIs of already migrated libraries this module depends on.
    pub fn libraries(&self) -> &[LibraryApi] {
        &self.libraries
    }

    /// Record that `path` was deleted. Returns false if it already was.
    pub fn mark_deleted(&mut self, path: &Path) -> bool {
        self.deleted.insert(path.to_path_buf())
    }

    pub fn is_marked_deleted(&self, path: &Path) -> bool {
        self.deleted.contains(path) || path.ancestors().any(|a| self.deleted.contains(a))
    }

    pub fn warn(&mut self, path: &Path, message: impl Into<String>) {
        let message = message.into();
        warn!(path = %path.display(), "{}", message);
        self.warnings.push(Warning {
            path: path.to_path_buf(),
            message,
        });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
