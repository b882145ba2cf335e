//! Phase 1: content transformation
//!
//! Runs the task chain over the source tree and writes the result into the
//! target tree. Nothing is moved, renamed or deleted on disk here apart from
//! what tasks request through working copies.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ModuleConfig;
use crate::context::{MigrationContext, Warning};
use crate::error::{IoResultExt, Result};
use crate::overlay::ManualFixOverlay;
use crate::task::TaskChain;
use crate::tree::TreeWalker;
use crate::writer::{WriteReport, Writer};

/// Summary of a content phase run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentReport {
    /// Files handed to the task chain
    pub visited: usize,
    /// Files at least one task accepted
    pub processed: usize,
    pub imports_inserted: usize,
    pub manual_fixes: usize,
    #[serde(flatten)]
    pub write: WriteReport,
    pub warnings: Vec<Warning>,
    pub elapsed_ms: u64,
}

/// The content phase engine.
pub struct ContentPhase<'a> {
    config: &'a ModuleConfig,
    chain: TaskChain,
    overlay: ManualFixOverlay,
}

impl<'a> ContentPhase<'a> {
    /// Engine using the manual fixes from `config`.
    pub fn new(config: &'a ModuleConfig, chain: TaskChain) -> Self {
        Self {
            config,
            chain,
            overlay: ManualFixOverlay::new(config.manual_fixes.clone()),
        }
    }

    pub fn with_overlay(mut self, overlay: ManualFixOverlay) -> Self {
        self.overlay = overlay;
        self
    }

    /// Run with a fresh context.
    pub fn run(&mut self) -> Result<ContentReport> {
        let mut ctx = MigrationContext::new(self.config);
        self.run_with(&mut ctx)
    }

    /// pre-tasks, walk with the task chain, post-tasks, import insertion,
    /// manual fixes, write. Any fatal error aborts before the write.
    pub fn run_with(&mut self, ctx: &mut MigrationContext<'_>) -> Result<ContentReport> {
        let started = Instant::now();
        self.config.validate()?;
        self.config.log_summary();
        fs::create_dir_all(&self.config.target_dir).at(&self.config.target_dir)?;

        self.chain.run_pre(ctx)?;
        self.chain.setup(ctx)?;

        let mut report = ContentReport::default();
        let walker = TreeWalker::new(&self.config.source_dir)
            .with_optional_include(self.config.include_filter());
        let chain = &mut self.chain;
        walker.visit(|info| {
            report.visited += 1;
            if chain.process(&info, ctx)? > 0 {
                report.processed += 1;
            }
            Ok(())
        })?;
        debug!(visited = report.visited, processed = report.processed, "task chain done");

        self.chain.run_post(ctx)?;
        report.imports_inserted = insert_pending_imports(ctx)?;
        report.manual_fixes = self.overlay.apply_all(ctx)?;
        report.write = Writer::new(self.config).write_all(ctx)?;
        report.warnings = ctx.warnings().to_vec();
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            "content phase finished in {}",
            humantime::format_duration(Duration::from_millis(report.elapsed_ms))
        );
        Ok(report)
    }
}

/// Insert queued imports into every recognized file, right after its
/// copyright header. Returns the number of files changed.
pub fn insert_pending_imports(ctx: &mut MigrationContext<'_>) -> Result<usize> {
    let mut changed = 0;
    for path in ctx.recognized_paths() {
        let Some(imports) = ctx.take_imports(&path) else {
            continue;
        };
        let file = ctx.js_file(&path)?;
        let wc = ctx.working_copy(&path);
        let Some(updated) = with_imports(wc.source()?, file.header_end, &imports) else {
            continue;
        };
        if wc.set_source(updated)? {
            changed += 1;
        }
    }
    Ok(changed)
}

fn with_imports(
    source: &str,
    at_line: usize,
    imports: &BTreeMap<String, BTreeSet<String>>,
) -> Option<String> {
    let statements: Vec<String> = imports
        .iter()
        .map(|(library, names)| {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            format!("import {{{}}} from '{}';", names.join(", "), library)
        })
        .filter(|stmt| !source.lines().any(|line| line.trim() == stmt))
        .collect();
    if statements.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(source.len() + statements.len() * 48);
    let mut lines = source.split_inclusive('\n');
    for line in lines.by_ref().take(at_line) {
        out.push_str(line);
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for stmt in &statements {
        out.push_str(stmt);
        out.push('\n');
    }
    out.push('\n');
    for line in lines {
        out.push_str(line);
    }
    Some(out)
}
