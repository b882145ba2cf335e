//! Persisted public API snapshots of migrated libraries
//!
//! A migration can write the API of the module it migrated to a JSON file.
//! Migrating a dependent module later loads these snapshots to learn which
//! library each referenced symbol comes from.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IoResultExt, MigrationError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryApi {
    /// npm name, e.g. `@eclipse-scout/core`
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub enums: Vec<String>,
    #[serde(default)]
    pub utilities: Vec<String>,
}

impl LibraryApi {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Sort and deduplicate every symbol list.
    pub fn normalize(&mut self) {
        for list in [&mut self.classes, &mut self.enums, &mut self.utilities] {
            list.sort();
            list.dedup();
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).at(path)?;
        serde_json::from_str(&text).map_err(|source| MigrationError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load every `*.json` snapshot in `dir` in file-name order, skipping `except`.
    pub fn load_dir(dir: &Path, except: Option<&Path>) -> Result<Vec<Self>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .at(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
            .filter(|p| except != Some(p.as_path()))
            .collect();
        files.sort();

        let mut apis = Vec::with_capacity(files.len());
        for file in files {
            let api = Self::load(&file)?;
            debug!(library = %api.name, file = %file.display(), "loaded library api");
            apis.push(api);
        }
        Ok(apis)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| MigrationError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        crate::tree::ensure_parent(path)?;
        fs::write(path, json + "\n").at(path)?;
        info!(library = %self.name, file = %path.display(), "persisted library api");
        Ok(())
    }
}
