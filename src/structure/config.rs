//! Settings for the structural reorganization phase

use std::path::PathBuf;

use serde::Deserialize;

/// A one-off move of a well-known file, relative to the target root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Relocation {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Naming conventions the structural rules look for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureSettings {
    /// Content marker identifying a JSON model definition
    pub model_marker: String,
    /// Appended to a model file's base name when it is renamed
    pub model_suffix: String,
    /// Extension given to renamed model files
    pub model_extension: String,
    pub relocations: Vec<Relocation>,
    /// Legacy `*-module.*` files deleted instead of renamed
    pub deleted_module_names: Vec<String>,
    /// Directory whose legacy `index*` files are deleted
    pub shared_dir: String,
    /// File-name globs deleted outright
    pub delete_patterns: Vec<String>,
    /// Vendored libraries whose `<name>-<version>` folders are removed
    pub vendored_libraries: Vec<String>,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            model_marker: "objectType:".to_string(),
            model_suffix: "-model".to_string(),
            model_extension: "js".to_string(),
            relocations: Vec::new(),
            deleted_module_names: vec!["login-module.less".to_string(), "logout-module.less".to_string()],
            shared_dir: "_shared".to_string(),
            delete_patterns: vec![
                "*-macro.js".to_string(),
                "*-macro.less".to_string(),
                "*.module".to_string(),
            ],
            vendored_libraries: Vec::new(),
        }
    }
}
