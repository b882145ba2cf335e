//! Manual-fix overlay: project-specific textual patches applied last
//!
//! Each rule is keyed by namespace and path suffix and runs once per working
//! copy, after all tasks and before anything is written.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::context::MigrationContext;
use crate::error::Result;

/// One textual patch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManualFix {
    pub namespace: String,
    /// Matched against the end of the file path, component-wise
    pub path_suffix: String,
    #[serde(flatten)]
    pub action: FixAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixAction {
    /// Replace the first occurrence of `find`.
    Replace { find: String, replace: String },
    /// Insert `text` right after the first occurrence of `anchor`.
    InsertAfter { anchor: String, text: String },
}

impl ManualFix {
    pub fn applies_to(&self, namespace: &str, path: &Path) -> bool {
        self.namespace == namespace && path.ends_with(&self.path_suffix)
    }

    /// The patched text, or `None` when the rule's trigger is absent or it
    /// has already been applied.
    pub fn apply(&self, source: &str) -> Option<String> {
        match &self.action {
            FixAction::Replace { find, replace } => {
                if find.is_empty() || !source.contains(find.as_str()) {
                    return None;
                }
                if replace.contains(find.as_str()) && source.contains(replace.as_str()) {
                    return None;
                }
                Some(source.replacen(find.as_str(), replace, 1))
            }
            FixAction::InsertAfter { anchor, text } => {
                let at = source.find(anchor.as_str())? + anchor.len();
                if source[at..].starts_with(text.as_str()) {
                    return None;
                }
                let mut out = String::with_capacity(source.len() + text.len());
                out.push_str(&source[..at]);
                out.push_str(text);
                out.push_str(&source[at..]);
                Some(out)
            }
        }
    }
}

/// The ordered table of manual fixes for a run.
#[derive(Debug, Clone, Default)]
pub struct ManualFixOverlay {
    fixes: Vec<ManualFix>,
}

impl ManualFixOverlay {
    pub fn new(fixes: Vec<ManualFix>) -> Self {
        Self { fixes }
    }

    /// Apply matching rules to one working copy. Returns how many fired.
    pub fn apply_to(&self, ctx: &mut MigrationContext<'_>, path: &Path) -> Result<usize> {
        let namespace = ctx.config().namespace.clone();
        let mut fired = 0;
        for fix in self.fixes.iter().filter(|f| f.applies_to(&namespace, path)) {
            let wc = ctx.working_copy(path);
            if wc.is_deleted() {
                break;
            }
            if let Some(patched) = fix.apply(wc.source()?) {
                wc.set_source(patched)?;
                debug!(path = %path.display(), suffix = %fix.path_suffix, "applied manual fix");
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// Apply the overlay once to every working copy of the run.
    ///
    /// A fix of this module whose path suffix matches no working copy is
    /// reported as a warning.
    pub fn apply_all(&self, ctx: &mut MigrationContext<'_>) -> Result<usize> {
        if self.fixes.is_empty() {
            return Ok(0);
        }
        let namespace = ctx.config().namespace.clone();
        let paths = ctx.working_copy_paths();
        let mut fired = 0;
        for path in &paths {
            fired += self.apply_to(ctx, path)?;
        }
        for fix in self.fixes.iter().filter(|f| f.namespace == namespace) {
            if !paths.iter().any(|p| fix.applies_to(&namespace, p)) {
                ctx.warn(
                    Path::new(&fix.path_suffix),
                    "manual fix matches no file touched by the migration",
                );
            }
        }
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleConfig;
    use std::fs;
    use tempfile::TempDir;

    fn replace(find: &str, replace: &str) -> ManualFix {
        ManualFix {
            namespace: "scout".into(),
            path_suffix: "scout/App.js".into(),
            action: FixAction::Replace {
                find: find.into(),
                replace: replace.into(),
            },
        }
    }

    #[test]
    fn test_replace_is_idempotent() {
        let fix = replace("scout.App.init()", "App.init()");
        let once = fix.apply("x; scout.App.init();").unwrap();
        assert_eq!(once, "x; App.init();");
        assert_eq!(fix.apply(&once), None);
    }

    #[test]
    fn test_replace_containing_trigger_applies_once() {
        let fix = replace("init()", "init(); // checked: init()");
        let once = fix.apply("init()").unwrap();
        assert_eq!(fix.apply(&once), None);
    }

    #[test]
    fn test_insert_after_is_idempotent() {
        let fix = ManualFix {
            namespace: "scout".into(),
            path_suffix: "App.js".into(),
            action: FixAction::InsertAfter {
                anchor: "import * as self from './index';\n".into(),
                text: "export default self;\n".into(),
            },
        };
        let src = "import * as self from './index';\nfoo();\n";
        let once = fix.apply(src).unwrap();
        assert_eq!(
            once,
            "import * as self from './index';\nexport default self;\nfoo();\n"
        );
        assert_eq!(fix.apply(&once), None);
    }

    #[test]
    fn test_rule_gated_by_namespace_and_suffix() {
        let fix = replace("a", "b");
        assert!(fix.applies_to("scout", Path::new("/m/src/main/js/scout/App.js")));
        assert!(!fix.applies_to("crm", Path::new("/m/src/main/js/scout/App.js")));
        assert!(!fix.applies_to("scout", Path::new("/m/src/main/js/scout/MyApp.js")));
    }

    #[test]
    fn test_apply_all_edits_working_copies() {
        let dir = TempDir::new().unwrap();
        let app = dir.path().join("src/main/js/scout/App.js");
        fs::create_dir_all(app.parent().unwrap()).unwrap();
        fs::write(&app, "scout.App.init();").unwrap();

        let config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        let mut ctx = MigrationContext::new(&config);
        ctx.working_copy(&app);

        let overlay = ManualFixOverlay::new(vec![replace("scout.App.init()", "App.init()")]);
        assert_eq!(overlay.apply_all(&mut ctx).unwrap(), 1);
        assert_eq!(ctx.working_copy(&app).source().unwrap(), "App.init();");
        assert_eq!(overlay.apply_all(&mut ctx).unwrap(), 0);
        assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn test_unmatched_fix_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let config = ModuleConfig::new(dir.path(), dir.path().join("out"), "scout");
        let mut ctx = MigrationContext::new(&config);
        let mut other = replace("a", "b");
        other.namespace = "crm".into();
        let overlay = ManualFixOverlay::new(vec![replace("a", "b"), other]);

        assert_eq!(overlay.apply_all(&mut ctx).unwrap(), 0);
        assert_eq!(ctx.warnings().len(), 1);
        assert_eq!(ctx.warnings()[0].path, Path::new("scout/App.js"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let fix: ManualFix = toml::from_str(
            r#"
            namespace = "scout"
            path_suffix = "scout/App.js"
            kind = "replace"
            find = "a"
            replace = "b"
            "#,
        )
        .unwrap();
        assert_eq!(fix, replace("a", "b"));
    }
}
