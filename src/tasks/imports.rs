use std::collections::HashMap;

use tracing::debug;

use crate::context::MigrationContext;
use crate::error::Result;
use crate::path_info::PathInfo;
use crate::recognize::references;
use crate::task::Task;

/// Queues imports for classes a file uses from already migrated libraries.
///
/// Needs the file to be recognized first, so it must come after
/// `RecognizeJsTask` in the chain.
#[derive(Debug, Default)]
pub struct LibraryImportsTask {
    /// namespace -> class -> library
    exports: HashMap<String, HashMap<String, String>>,
}

impl Task for LibraryImportsTask {
    fn name(&self) -> &str {
        "library-imports"
    }

    fn setup(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        self.exports.clear();
        for library in ctx.libraries() {
            let classes = self.exports.entry(library.namespace.clone()).or_default();
            for class in &library.classes {
                // first snapshot in file-name order wins
                classes
                    .entry(class.clone())
                    .or_insert_with(|| library.name.clone());
            }
        }
        Ok(())
    }

    fn accept(&self, info: &PathInfo, ctx: &MigrationContext<'_>) -> bool {
        !self.exports.is_empty() && ctx.is_recognized(info.path())
    }

    fn process(&mut self, info: &PathInfo, ctx: &mut MigrationContext<'_>) -> Result<()> {
        let path = info.path();
        let file = ctx.js_file(path)?;
        let own_namespace = ctx.config().namespace.clone();
        let source = ctx.working_copy(path).source()?.to_string();

        for (namespace, classes) in &self.exports {
            for name in references(&source, namespace) {
                if *namespace == own_namespace && file.defines_class(&name) {
                    continue;
                }
                if let Some(library) = classes.get(&name) {
                    debug!(path = %path.display(), %library, %name, "queued import");
                    ctx.add_import(path, library, &name);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use crate::library::LibraryApi;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_queues_imports_for_library_classes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("src/main/js/crm/Desk.js");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(
            &file,
            "crm.Desk = function() {\n  scout.Widget.call(this);\n  new scout.Action();\n  scout.Unknown.x();\n};\n",
        )
        .unwrap();
        let config = ModuleConfig::new(dir.path(), dir.path().join("out"), "crm");
        let mut ctx = MigrationContext::new(&config);
        let mut core = LibraryApi::new("@eclipse-scout/core", "scout");
        core.classes = vec!["Action".into(), "Widget".into()];
        ctx.add_library(core);

        let mut task = LibraryImportsTask::default();
        task.setup(&mut ctx).unwrap();
        let info = PathInfo::with_root(&file, dir.path());
        assert!(!task.accept(&info, &ctx), "file is not recognized yet");
        ctx.js_file(&file).unwrap();
        assert!(task.accept(&info, &ctx));
        task.process(&info, &mut ctx).unwrap();

        let imports = ctx.take_imports(&file).unwrap();
        let names: Vec<_> = imports["@eclipse-scout/core"].iter().cloned().collect();
        assert_eq!(names, vec!["Action", "Widget"]);
    }

    #[test]
    fn test_own_definitions_are_not_imported() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("Widget.js");
        fs::write(&file, "scout.Widget = function() {\n};\nscout.Widget.prototype.x = 1;\n").unwrap();
        let config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        let mut ctx = MigrationContext::new(&config);
        let mut core = LibraryApi::new("@eclipse-scout/core", "scout");
        core.classes = vec!["Widget".into()];
        ctx.add_library(core);

        let mut task = LibraryImportsTask::default();
        task.setup(&mut ctx).unwrap();
        ctx.js_file(&file).unwrap();
        task.process(&PathInfo::with_root(&file, dir.path()), &mut ctx).unwrap();
        assert!(ctx.take_imports(&file).is_none());
    }
}
