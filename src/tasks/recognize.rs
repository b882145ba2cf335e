use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::{JS_SOURCE_DIR, ModuleConfig};
use crate::context::MigrationContext;
use crate::error::Result;
use crate::path_info::PathInfo;
use crate::task::Task;

/// Recognizes every JavaScript source so later tasks can use its structure.
pub struct RecognizeJsTask {
    only: Option<HashSet<PathBuf>>,
}

impl RecognizeJsTask {
    pub fn new(config: &ModuleConfig) -> Self {
        let only = config
            .parse_only_include_files
            .then(|| config.include_files.iter().cloned().collect());
        Self { only }
    }
}

impl Task for RecognizeJsTask {
    fn name(&self) -> &str {
        "recognize-js"
    }

    fn accept(&self, info: &PathInfo, _ctx: &MigrationContext<'_>) -> bool {
        if !info.has_extension("js") || !info.is_under(JS_SOURCE_DIR) {
            return false;
        }
        match (&self.only, info.module_relative()) {
            (Some(only), Some(rel)) => only.contains(rel),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    fn process(&mut self, info: &PathInfo, ctx: &mut MigrationContext<'_>) -> Result<()> {
        ctx.js_file(info.path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_accepts_js_below_source_dir() {
        let dir = TempDir::new().unwrap();
        let config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        let ctx = MigrationContext::new(&config);
        let task = RecognizeJsTask::new(&config);
        let info = |rel: &str| PathInfo::with_root(dir.path().join(rel), dir.path());

        assert!(task.accept(&info("src/main/js/scout/Widget.js"), &ctx));
        assert!(!task.accept(&info("src/main/js/scout/Widget.less"), &ctx));
        assert!(!task.accept(&info("src/test/js/WidgetSpec.js"), &ctx));
    }

    #[test]
    fn test_parse_only_include_files() {
        let dir = TempDir::new().unwrap();
        let mut config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        config.include_files = vec![PathBuf::from("src/main/js/scout/A.js")];
        config.parse_only_include_files = true;
        let ctx = MigrationContext::new(&config);
        let task = RecognizeJsTask::new(&config);
        let info = |rel: &str| PathInfo::with_root(dir.path().join(rel), dir.path());

        assert!(task.accept(&info("src/main/js/scout/A.js"), &ctx));
        assert!(!task.accept(&info("src/main/js/scout/B.js"), &ctx));
    }

    #[test]
    fn test_process_records_warnings_without_editing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("src/main/js/scout/A.js");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "scout.A = function() {\n};\nscout.VERSION = 1;\n").unwrap();
        let config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        let mut ctx = MigrationContext::new(&config);

        let mut task = RecognizeJsTask::new(&config);
        task.process(&PathInfo::with_root(&file, dir.path()), &mut ctx).unwrap();
        assert!(ctx.is_recognized(&file));
        assert_eq!(ctx.warnings().len(), 1);
        assert!(ctx.dirty_paths().is_empty());
    }
}
