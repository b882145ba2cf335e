//! Phase 2: structural reorganization of the target tree
//!
//! Runs strictly after the content phase has written everything. Moves,
//! renames and deletes files by naming convention, then prunes directories
//! left empty. Every step refuses to overwrite an existing file and treats a
//! missing file as already handled, so a second run is a no-op.

pub mod config;
mod rules;

pub use config::{Relocation, StructureSettings};
pub use rules::{Action, MarkerClassifier, ModelClassifier, Rules, index_name};

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{JS_SOURCE_DIR, ModuleConfig};
use crate::context::MigrationContext;
use crate::error::{IoResultExt, Result};
use crate::path_info::PathInfo;
use crate::tree::{PathFilter, TreeWalker, delete_file, filter, move_file, prune_empty_dirs};

/// Summary of a structure phase run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    /// Files moved by relocations and folder flattening
    pub moved: usize,
    pub renamed: usize,
    /// Files and vendored folders removed
    pub deleted: usize,
    /// Empty directories removed
    pub pruned: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl StructureReport {
    /// True if the run did not touch the tree.
    pub fn is_noop(&self) -> bool {
        self.moved == 0 && self.renamed == 0 && self.deleted == 0 && self.pruned == 0
    }
}

/// The structure phase engine.
pub struct StructurePhase<'a> {
    config: &'a ModuleConfig,
    classifier: Option<Box<dyn ModelClassifier>>,
}

impl<'a> StructurePhase<'a> {
    pub fn new(config: &'a ModuleConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    /// Replace the marker based model detection.
    pub fn with_classifier(mut self, classifier: Box<dyn ModelClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn run(&mut self) -> Result<StructureReport> {
        let mut ctx = MigrationContext::new(self.config);
        self.run_with(&mut ctx)
    }

    /// Store pending edits, relocate, flatten, apply the per-file rules and
    /// prune. `ctx` must have been built for the target tree.
    pub fn run_with(&mut self, ctx: &mut MigrationContext<'_>) -> Result<StructureReport> {
        let started = Instant::now();
        self.config.validate_target()?;
        let mut rules = Rules::new(self.config)?;
        if let Some(classifier) = self.classifier.take() {
            rules = rules.with_classifier(classifier);
        }

        let stored = ctx.store_all()?;
        if stored > 0 {
            debug!(stored, "stored pending edits before reorganizing");
        }

        let mut report = StructureReport::default();
        report.moved += self.relocate()?;
        report.moved += self.flatten_js_folder()?;
        self.apply_rules(&rules, ctx, &mut report)?;
        report.pruned = prune_empty_dirs(&self.config.target_dir)?.len();
        report.elapsed = started.elapsed();

        info!(
            moved = report.moved,
            renamed = report.renamed,
            deleted = report.deleted,
            pruned = report.pruned,
            "structure phase finished in {}",
            humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64))
        );
        Ok(report)
    }

    fn relocate(&self) -> Result<usize> {
        let root = &self.config.target_dir;
        let mut moved = 0;
        for relocation in &self.config.structure.relocations {
            let from = root.join(&relocation.from);
            let to = root.join(&relocation.to);
            if move_file(&from, &to)? {
                debug!(from = %from.display(), to = %to.display(), "relocated");
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Move `src/main/js/<js_folder>/**` up into `src/main/js`, leaving files
    /// outside the include filter where they are.
    fn flatten_js_folder(&self) -> Result<usize> {
        if !self.config.remove_js_folder {
            return Ok(0);
        }
        let root = &self.config.target_dir;
        let js_root = Path::new(JS_SOURCE_DIR);
        let folder = js_root.join(self.config.js_folder_name());
        if !root.join(&folder).is_dir() {
            return Ok(0);
        }

        let mut walker = TreeWalker::new(root).with_include(filter::under(folder.clone()));
        if let Some(include) = self.config.include_filter() {
            walker = walker.with_exclude(move |info: &PathInfo| !include.test(info));
        }
        let mut moved = 0;
        for info in walker.walk()? {
            let Some(rel) = info.module_relative().and_then(|r| r.strip_prefix(&folder).ok()) else {
                continue;
            };
            let to = root.join(js_root).join(rel);
            if move_file(info.path(), &to)? {
                moved += 1;
            }
        }
        debug!(moved, folder = %folder.display(), "flattened js folder");
        Ok(moved)
    }

    fn apply_rules(
        &self,
        rules: &Rules<'_>,
        ctx: &mut MigrationContext<'_>,
        report: &mut StructureReport,
    ) -> Result<()> {
        let files = TreeWalker::new(&self.config.target_dir).walk()?;
        for info in files {
            let path = info.path();
            if ctx.is_marked_deleted(path) || !path.exists() {
                continue;
            }
            match rules.classify(&info)? {
                None => {}
                Some(Action::Rename(to)) => {
                    if move_file(path, &to)? {
                        debug!(from = %path.display(), to = %to.display(), "renamed");
                        ctx.forget(path);
                        report.renamed += 1;
                    }
                }
                Some(Action::Delete) => {
                    if ctx.mark_deleted(path) && delete_file(path)? {
                        debug!(path = %path.display(), "deleted");
                        ctx.forget(path);
                        report.deleted += 1;
                    }
                }
                Some(Action::DeleteDir(dir)) => {
                    if ctx.mark_deleted(&dir) && delete_dir(&dir)? {
                        info!(dir = %dir.display(), "removed vendored library");
                        report.deleted += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

fn delete_dir(dir: &Path) -> Result<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).at(dir),
    }
}
