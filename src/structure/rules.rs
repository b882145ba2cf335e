//! Per-file structural rules
//!
//! Each rule looks at one file of the target tree and decides whether it is
//! renamed, deleted or left alone. A rule never fires on its own output, so
//! running the rules over an already migrated tree changes nothing.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::ModuleConfig;
use crate::error::{IoResultExt, MigrationError, Result};
use crate::path_info::PathInfo;
use crate::tree::{GlobFilter, PathFilter};

use super::config::StructureSettings;

const MODULE_SUFFIX: &str = "-module";

/// Decides whether a JSON file is a UI model definition.
pub trait ModelClassifier {
    fn is_model(&self, path: &Path, content: &str) -> bool;
}

/// Classifies by the presence of a marker substring anywhere in the file.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    marker: String,
}

impl MarkerClassifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self { marker: marker.into() }
    }
}

impl ModelClassifier for MarkerClassifier {
    fn is_model(&self, _path: &Path, content: &str) -> bool {
        content.contains(&self.marker)
    }
}

/// What to do with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Rename(PathBuf),
    Delete,
    /// Remove a whole vendored library folder
    DeleteDir(PathBuf),
}

/// The compiled rule set for one module.
pub struct Rules<'a> {
    settings: &'a StructureSettings,
    js_folder: &'a str,
    use_index_js: bool,
    delete_globs: Vec<GlobFilter>,
    vendored: Vec<Regex>,
    classifier: Box<dyn ModelClassifier>,
}

impl<'a> Rules<'a> {
    pub fn new(config: &'a ModuleConfig) -> Result<Self> {
        let settings = &config.structure;
        let delete_globs = settings
            .delete_patterns
            .iter()
            .map(|p| GlobFilter::new(p))
            .collect::<Result<Vec<_>>>()?;
        let vendored = settings
            .vendored_libraries
            .iter()
            .map(|name| {
                Regex::new(&format!(r"^{}-\d[\w.\-]*$", regex::escape(name))).map_err(|e| {
                    MigrationError::Configuration(format!(
                        "invalid vendored library name '{}': {}",
                        name, e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            settings,
            js_folder: config.js_folder_name(),
            use_index_js: config.use_index_js,
            delete_globs,
            vendored,
            classifier: Box::new(MarkerClassifier::new(settings.model_marker.clone())),
        })
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ModelClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Decide the action for `info`. The first matching rule wins.
    pub fn classify(&self, info: &PathInfo) -> Result<Option<Action>> {
        let Some(name) = info.file_name() else {
            return Ok(None);
        };
        let path = info.path();

        if let Some(dir) = self.vendored_dir(info) {
            return Ok(Some(Action::DeleteDir(dir)));
        }
        if self.delete_globs.iter().any(|g| g.test(info)) {
            return Ok(Some(Action::Delete));
        }
        let shared = self.in_shared_dir(info);
        if shared && is_legacy_index(name) {
            return Ok(Some(Action::Delete));
        }
        if let Some(stem) = module_stem(name) {
            // an index renamed into `_shared` would be deleted by the next run
            if shared || self.settings.deleted_module_names.iter().any(|n| n == name) {
                return Ok(Some(Action::Delete));
            }
            if self.use_index_js {
                let ext = Path::new(name).extension().and_then(|e| e.to_str());
                return Ok(Some(Action::Rename(
                    path.with_file_name(index_name(stem, ext, self.js_folder)),
                )));
            }
            return Ok(None);
        }
        if info.has_extension("json") && self.is_model(path)? {
            return Ok(Some(Action::Rename(self.model_path(path))));
        }
        Ok(None)
    }

    fn is_model(&self, path: &Path) -> Result<bool> {
        let bytes = fs::read(path).at(path)?;
        Ok(self.classifier.is_model(path, &String::from_utf8_lossy(&bytes)))
    }

    fn model_path(&self, path: &Path) -> PathBuf {
        let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        path.with_file_name(format!(
            "{}{}.{}",
            stem, self.settings.model_suffix, self.settings.model_extension
        ))
    }

    fn in_shared_dir(&self, info: &PathInfo) -> bool {
        info.module_relative()
            .and_then(Path::parent)
            .is_some_and(|p| p.iter().any(|c| c == self.settings.shared_dir.as_str()))
    }

    /// Outermost `<name>-<version>` folder of a vendored library that
    /// contains `info`.
    fn vendored_dir(&self, info: &PathInfo) -> Option<PathBuf> {
        if self.vendored.is_empty() {
            return None;
        }
        let depth = info.module_relative()?.components().count();
        info.path()
            .ancestors()
            .skip(1)
            .take(depth.saturating_sub(1))
            .filter(|dir| {
                dir.file_name()
                    .map(|n| n.to_string_lossy())
                    .is_some_and(|n| self.vendored.iter().any(|re| re.is_match(&n)))
            })
            .last()
            .map(Path::to_path_buf)
    }
}

/// `index.js`, `index.less`, but not the `index-Foo.js` a module rename produces
fn is_legacy_index(name: &str) -> bool {
    Path::new(name).file_stem().is_some_and(|s| s == "index")
}

/// `Foo-module.js` -> `Foo`
fn module_stem(name: &str) -> Option<&str> {
    let stem = match name.rfind('.') {
        Some(i) => &name[..i],
        None => name,
    };
    stem.strip_suffix(MODULE_SUFFIX).filter(|s| !s.is_empty())
}

/// Consolidated index name for a legacy module stem.
///
/// A stem naming the module folder itself becomes `index`; otherwise the
/// part after the first hyphen is kept (`bar-Foo` -> `index-Foo`), or the
/// whole stem if there is none (`foo` -> `index-foo`).
pub fn index_name(stem: &str, ext: Option<&str>, js_folder: &str) -> String {
    let base = if stem == js_folder {
        "index".to_string()
    } else {
        match stem.split_once('-') {
            Some((_, rest)) if !rest.is_empty() => format!("index-{}", rest),
            _ => format!("index-{}", stem),
        }
    };
    match ext {
        Some(ext) => format!("{}.{}", base, ext),
        None => base,
    }
}
