//! Module configuration: what to migrate, where to, and how

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::{IoResultExt, MigrationError, Result};
use crate::overlay::ManualFix;
use crate::structure::StructureSettings;
use crate::tree::filter::{self, PathFilter, PathFilterExt};
use crate::tree::GlobFilter;

/// Module-relative directory holding the JavaScript sources.
pub const JS_SOURCE_DIR: &str = "src/main/js";

/// One migration unit.
///
/// Built once at startup, validated with `validate()`, then passed by
/// reference to every component of the run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    /// JS namespace of the migrated library, e.g. `scout`
    pub namespace: String,
    /// Folder below `src/main/js` holding this module's files; defaults to the namespace
    pub js_folder_name: Option<String>,
    /// Wipe the target directory before writing
    pub clean_target: bool,
    /// Folder with library API snapshots of earlier migrations
    pub library_api_dir: Option<PathBuf>,
    /// npm name under which this module's API is persisted
    pub persist_library_name: Option<String>,
    /// File name (inside `library_api_dir`) the API is persisted to
    pub persist_library_file_name: Option<String>,
    /// Flatten `src/main/js/<js_folder_name>` into `src/main/js`
    pub remove_js_folder: bool,
    /// Rename legacy `*-module.*` files to `index*`
    pub use_index_js: bool,
    /// If non-empty, only these module-relative files are migrated
    pub include_files: Vec<PathBuf>,
    /// Only recognize include files; everything is still copied
    pub parse_only_include_files: bool,
    pub structure: StructureSettings,
    #[serde(rename = "manual_fix")]
    pub manual_fixes: Vec<ManualFix>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            target_dir: PathBuf::new(),
            namespace: String::new(),
            js_folder_name: None,
            clean_target: true,
            library_api_dir: None,
            persist_library_name: None,
            persist_library_file_name: None,
            remove_js_folder: true,
            use_index_js: true,
            include_files: Vec::new(),
            parse_only_include_files: false,
            structure: StructureSettings::default(),
            manual_fixes: Vec::new(),
        }
    }
}

impl ModuleConfig {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Load from a TOML file. Relative paths resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).at(path)?;
        let mut config: Self = toml::from_str(&text).map_err(|source| MigrationError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_against(base);
        Ok(config)
    }

    fn resolve_against(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if !p.as_os_str().is_empty() && p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.source_dir);
        resolve(&mut self.target_dir);
        if let Some(dir) = self.library_api_dir.as_mut() {
            resolve(dir);
        }
    }

    /// Check every precondition of a run. Touches no files.
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() || !self.source_dir.is_dir() {
            return Err(MigrationError::Configuration(format!(
                "'source_dir' with value '{}' is not set, does not exist or is not a directory",
                self.source_dir.display()
            )));
        }
        if self.target_dir.as_os_str().is_empty() {
            return Err(MigrationError::Configuration("'target_dir' is not set".to_string()));
        }
        self.validate_nesting()?;
        if self.namespace.trim().is_empty() {
            return Err(MigrationError::Configuration(format!(
                "'namespace' with value '{}' is not set",
                self.namespace
            )));
        }
        if self.persist_library_file_name.is_some() {
            if self
                .persist_library_name
                .as_deref()
                .is_none_or(|n| n.trim().is_empty())
            {
                return Err(MigrationError::Configuration(
                    "if 'persist_library_file_name' is set, 'persist_library_name' must also be set"
                        .to_string(),
                ));
            }
            if self.library_api_dir.is_none() {
                return Err(MigrationError::Configuration(
                    "if 'persist_library_file_name' is set, 'library_api_dir' must also be set"
                        .to_string(),
                ));
            }
        }
        if let Some(dir) = &self.library_api_dir {
            if !dir.is_dir() {
                return Err(MigrationError::Configuration(format!(
                    "'library_api_dir' with value '{}' does not exist or is not a directory",
                    dir.display()
                )));
            }
        }
        self.validate_structure()
    }

    /// Preconditions of the structure phase, which only needs the target tree.
    pub fn validate_target(&self) -> Result<()> {
        if self.target_dir.as_os_str().is_empty() || !self.target_dir.is_dir() {
            return Err(MigrationError::Configuration(format!(
                "'target_dir' with value '{}' is not set, does not exist or is not a directory",
                self.target_dir.display()
            )));
        }
        if self.namespace.trim().is_empty() {
            return Err(MigrationError::Configuration(format!(
                "'namespace' with value '{}' is not set",
                self.namespace
            )));
        }
        self.validate_structure()
    }

    /// Source and target may be the same directory, but neither may lie
    /// inside the other: cleaning the target would delete the source, and
    /// the source walk would pick up the target's own output.
    fn validate_nesting(&self) -> Result<()> {
        if self.migrates_in_place() {
            return Ok(());
        }
        let source = normalized(&self.source_dir);
        let target = normalized(&self.target_dir);
        if source.starts_with(&target) {
            return Err(MigrationError::Configuration(format!(
                "'target_dir' with value '{}' contains 'source_dir' '{}'",
                self.target_dir.display(),
                self.source_dir.display()
            )));
        }
        if target.starts_with(&source) {
            return Err(MigrationError::Configuration(format!(
                "'target_dir' with value '{}' lies inside 'source_dir' '{}'",
                self.target_dir.display(),
                self.source_dir.display()
            )));
        }
        Ok(())
    }

    fn validate_structure(&self) -> Result<()> {
        if self.structure.model_marker.is_empty() {
            return Err(MigrationError::Configuration(
                "'structure.model_marker' must not be empty".to_string(),
            ));
        }
        for pattern in &self.structure.delete_patterns {
            GlobFilter::new(pattern)?;
        }
        Ok(())
    }

    pub fn js_folder_name(&self) -> &str {
        self.js_folder_name.as_deref().unwrap_or(&self.namespace)
    }

    /// `library_api_dir / persist_library_file_name`, if both are set.
    pub fn persist_library_file(&self) -> Option<PathBuf> {
        let dir = self.library_api_dir.as_ref()?;
        let name = self.persist_library_file_name.as_ref()?;
        Some(dir.join(name))
    }

    /// Include filter built from `include_files`, if any are configured.
    pub fn include_filter(&self) -> Option<Box<dyn PathFilter>> {
        if self.include_files.is_empty() {
            return None;
        }
        Some(filter::one_of(self.include_files.iter().cloned()).boxed())
    }

    /// True if source and target name the same directory.
    pub fn migrates_in_place(&self) -> bool {
        normalized(&self.source_dir) == normalized(&self.target_dir)
    }

    /// True if wiping the target would also wipe the source.
    pub fn target_contains_source(&self) -> bool {
        normalized(&self.source_dir).starts_with(normalized(&self.target_dir))
    }

    pub fn log_summary(&self) {
        info!("source module directory: {}", self.source_dir.display());
        info!("target module directory: {}", self.target_dir.display());
        info!("namespace: {}", self.namespace);
        if let Some(name) = &self.persist_library_name {
            info!("persist library name: {}", name);
        }
        if let Some(file) = self.persist_library_file() {
            info!("persist library file: {}", file.display());
        }
        if let Some(dir) = &self.library_api_dir {
            info!("library api directory: {}", dir.display());
        }
    }
}

/// Absolute form of `path` with symlinks resolved as far as it exists.
/// The target usually does not exist before the first run.
fn normalized(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    for existing in path.ancestors() {
        if let (Ok(real), Ok(rest)) = (existing.canonicalize(), path.strip_prefix(existing)) {
            return real.join(rest);
        }
    }
    path
}
