//! The pluggable units of work run by the content phase
//!
//! Ordinary tasks run per file while the source tree is walked; pre- and
//! post-migration tasks run once around the walk. Order is the order of
//! registration and is preserved everywhere.

use std::path::Path;

use crate::context::MigrationContext;
use crate::error::{MigrationError, Result};
use crate::path_info::PathInfo;

/// A per-file transformation.
pub trait Task {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &str;

    /// Called once, in registration order, before any file is visited.
    fn setup(&mut self, _ctx: &mut MigrationContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Cheap, side-effect-free check whether `process` should run for `info`.
    fn accept(&self, info: &PathInfo, ctx: &MigrationContext<'_>) -> bool;

    /// Edit the working copy of `info` (and possibly of other files).
    fn process(&mut self, info: &PathInfo, ctx: &mut MigrationContext<'_>) -> Result<()>;
}

/// Runs once before the source tree is walked.
pub trait PreMigrationTask {
    fn name(&self) -> &str;
    fn execute(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()>;
}

/// Runs once after every file has been processed.
pub trait PostMigrationTask {
    fn name(&self) -> &str;
    fn execute(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()>;
}

/// Statically assembled, ordered set of tasks for one run.
#[derive(Default)]
pub struct TaskChain {
    pre: Vec<Box<dyn PreMigrationTask>>,
    tasks: Vec<Box<dyn Task>>,
    post: Vec<Box<dyn PostMigrationTask>>,
}

impl TaskChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre_task(mut self, task: impl PreMigrationTask + 'static) -> Self {
        self.pre.push(Box::new(task));
        self
    }

    pub fn task(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    pub fn post_task(mut self, task: impl PostMigrationTask + 'static) -> Self {
        self.post.push(Box::new(task));
        self
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    pub fn run_pre(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        for task in &mut self.pre {
            task.execute(ctx).map_err(|e| wrap(task.name(), ctx.config().source_dir.as_path(), e))?;
        }
        Ok(())
    }

    pub fn setup(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        for task in &mut self.tasks {
            task.setup(ctx).map_err(|e| wrap(task.name(), ctx.config().source_dir.as_path(), e))?;
        }
        Ok(())
    }

    /// Run every accepting task on one file, in order.
    ///
    /// Skippable errors are recorded as warnings; anything else aborts with
    /// the task name and path attached.
    pub fn process(&mut self, info: &PathInfo, ctx: &mut MigrationContext<'_>) -> Result<usize> {
        let mut ran = 0;
        for task in &mut self.tasks {
            if !task.accept(info, ctx) {
                continue;
            }
            ran += 1;
            match task.process(info, ctx) {
                Ok(()) => {}
                Err(e) if e.is_skippable() => ctx.warn(info.path(), e.to_string()),
                Err(e) => return Err(wrap(task.name(), info.path(), e)),
            }
        }
        Ok(ran)
    }

    pub fn run_post(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        for task in &mut self.post {
            task.execute(ctx).map_err(|e| wrap(task.name(), ctx.config().source_dir.as_path(), e))?;
        }
        Ok(())
    }
}

fn wrap(task: &str, path: &Path, err: MigrationError) -> MigrationError {
    MigrationError::Task {
        task: task.to_string(),
        path: path.to_path_buf(),
        source: Box::new(err),
    }
}
