//! Writes the result of the content phase into the target directory

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ModuleConfig;
use crate::context::MigrationContext;
use crate::error::{IoResultExt, MigrationError, Result};
use crate::tree::{TreeWalker, ensure_parent};
use crate::working_copy::Persisted;

/// Counts of what the writer did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: usize,
    pub copied: usize,
    pub deleted: usize,
}

impl WriteReport {
    fn record(&mut self, outcome: Persisted) {
        match outcome {
            Persisted::Written => self.written += 1,
            Persisted::Copied => self.copied += 1,
            Persisted::Deleted => self.deleted += 1,
        }
    }
}

pub struct Writer<'a> {
    config: &'a ModuleConfig,
}

impl<'a> Writer<'a> {
    pub fn new(config: &'a ModuleConfig) -> Self {
        Self { config }
    }

    /// Mirror the source tree into the target tree.
    ///
    /// Files with a working copy are persisted through it (honoring a
    /// relative target path override); all other files are copied byte for
    /// byte. Any failure aborts the write.
    pub fn write_all(&self, ctx: &mut MigrationContext<'_>) -> Result<WriteReport> {
        let source_root = &self.config.source_dir;
        let target_root = &self.config.target_dir;

        if self.config.clean_target {
            self.clean_target()?;
        }
        fs::create_dir_all(target_root).at(target_root)?;

        let mut report = WriteReport::default();
        let mut visited = HashSet::new();
        TreeWalker::new(source_root).visit(|info| {
            let path = info.path().to_path_buf();
            let rel = info.module_relative().unwrap_or(Path::new("")).to_path_buf();
            let outcome = match ctx.existing_working_copy(&path) {
                Some(wc) => {
                    let dest = target_root.join(wc.relative_target_path().unwrap_or(&rel));
                    wc.persist(&dest)?
                }
                None => copy_file(&path, &target_root.join(&rel))?,
            };
            report.record(outcome);
            visited.insert(path);
            Ok(())
        })?;

        // edited copies the walk did not reach, e.g. below a denied directory
        for path in ctx.working_copy_paths() {
            if visited.contains(&path) {
                continue;
            }
            let Some(wc) = ctx.existing_working_copy(&path) else {
                continue;
            };
            if !wc.is_dirty() && !wc.is_deleted() {
                continue;
            }
            let rel = match wc.relative_target_path() {
                Some(rel) => rel.to_path_buf(),
                None => match path.strip_prefix(source_root) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => {
                        ctx.warn(&path, "edited file lies outside the source directory, not written");
                        continue;
                    }
                },
            };
            let wc = ctx.working_copy(&path);
            report.record(wc.persist(&target_root.join(rel))?);
        }

        info!(
            written = report.written,
            copied = report.copied,
            deleted = report.deleted,
            "wrote target tree"
        );
        Ok(report)
    }

    fn clean_target(&self) -> Result<()> {
        let target = &self.config.target_dir;
        if self.config.migrates_in_place() {
            warn!(
                "source and target are the same directory, not cleaning '{}'",
                target.display()
            );
            return Ok(());
        }
        if self.config.target_contains_source() {
            return Err(MigrationError::Configuration(format!(
                "refusing to clean '{}', it contains the source directory",
                target.display()
            )));
        }
        if target.exists() {
            debug!(target = %target.display(), "cleaning target directory");
            fs::remove_dir_all(target).at(target)?;
        }
        Ok(())
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<Persisted> {
    if from != to {
        ensure_parent(to)?;
        fs::copy(from, to).at(from)?;
    }
    Ok(Persisted::Copied)
}
