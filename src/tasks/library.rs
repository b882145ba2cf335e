use tracing::info;

use crate::context::MigrationContext;
use crate::error::Result;
use crate::library::LibraryApi;
use crate::task::{PostMigrationTask, PreMigrationTask};

/// Loads the API snapshots of libraries migrated earlier.
pub struct LoadLibraryApisTask;

impl PreMigrationTask for LoadLibraryApisTask {
    fn name(&self) -> &str {
        "load-library-apis"
    }

    fn execute(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        let config = ctx.config();
        let Some(dir) = &config.library_api_dir else {
            return Ok(());
        };
        let own = config.persist_library_file();
        let libraries = LibraryApi::load_dir(dir, own.as_deref())?;
        info!(count = libraries.len(), "loaded library apis");
        for library in libraries {
            ctx.add_library(library);
        }
        Ok(())
    }
}

/// Writes this module's API so dependent modules can be migrated later.
pub struct PersistLibraryApiTask;

impl PersistLibraryApiTask {
    /// The API of every recognized file of the run.
    pub fn collect(ctx: &mut MigrationContext<'_>, name: &str) -> Result<LibraryApi> {
        let mut api = LibraryApi::new(name, ctx.config().namespace.clone());
        for path in ctx.recognized_paths() {
            let file = ctx.js_file(&path)?;
            api.classes.extend(file.classes.iter().map(|c| c.name.clone()));
            api.enums.extend(file.enums.iter().map(|e| e.qualified_name()));
            api.utilities.extend(file.utilities.iter().map(|u| u.name.clone()));
        }
        api.normalize();
        Ok(api)
    }
}

impl PostMigrationTask for PersistLibraryApiTask {
    fn name(&self) -> &str {
        "persist-library-api"
    }

    fn execute(&mut self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        let config = ctx.config();
        let (Some(name), Some(file)) = (&config.persist_library_name, config.persist_library_file())
        else {
            return Ok(());
        };
        let api = Self::collect(ctx, name)?;
        api.save(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_persist_then_load_roundtrip_skips_own_file() {
        let dir = TempDir::new().unwrap();
        let apis = dir.path().join("apis");
        fs::create_dir_all(&apis).unwrap();
        let js = dir.path().join("src/main/js/scout/Widget.js");
        fs::create_dir_all(js.parent().unwrap()).unwrap();
        fs::write(&js, "scout.Widget = function() {\n};\nscout.Widget.Mode = {\n};\n").unwrap();

        let mut config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        config.library_api_dir = Some(apis.clone());
        config.persist_library_name = Some("@eclipse-scout/core".into());
        config.persist_library_file_name = Some("01-core.json".into());

        let mut ctx = MigrationContext::new(&config);
        ctx.js_file(&js).unwrap();
        PersistLibraryApiTask.execute(&mut ctx).unwrap();

        let saved = LibraryApi::load(&apis.join("01-core.json")).unwrap();
        assert_eq!(saved.classes, vec!["Widget"]);
        assert_eq!(saved.enums, vec!["Widget.Mode"]);

        // the module's own snapshot is not loaded as a dependency
        let mut ctx = MigrationContext::new(&config);
        LoadLibraryApisTask.execute(&mut ctx).unwrap();
        assert!(ctx.libraries().is_empty());
    }

    #[test]
    fn test_nothing_persisted_without_settings() {
        let dir = TempDir::new().unwrap();
        let config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        let mut ctx = MigrationContext::new(&config);
        PersistLibraryApiTask.execute(&mut ctx).unwrap();
        LoadLibraryApisTask.execute(&mut ctx).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
