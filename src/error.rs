//! Error types shared by both migration phases

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that can abort a migration run.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The module configuration is invalid; raised before any file is touched.
    #[error("configuration is not valid: {0}")]
    Configuration(String),

    /// A move or rename would overwrite an existing file.
    #[error("cannot move '{}' to '{}': destination already exists", from.display(), to.display())]
    Conflict { from: PathBuf, to: PathBuf },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A task failed while processing one file.
    #[error("task '{task}' failed on '{}': {source}", path.display())]
    Task {
        task: String,
        path: PathBuf,
        #[source]
        source: Box<MigrationError>,
    },

    /// A recognizer could not make sense of a file.
    #[error("cannot parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in '{}': {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] ignore::Error),
}

impl MigrationError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MigrationError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn conflict(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        MigrationError::Conflict {
            from: from.into(),
            to: to.into(),
        }
    }

    /// True for errors that only mean "skip this file".
    pub fn is_skippable(&self) -> bool {
        matches!(self, MigrationError::Parse { .. })
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;

/// Attaches the offending path to a bare `io::Error`.
pub trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| MigrationError::io(path, e))
    }
}
