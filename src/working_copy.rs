//! In-memory, dirty-tracked buffer for one file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{IoResultExt, MigrationError, Result};
use crate::tree::ensure_parent;

/// Mutable copy of one file's content.
///
/// The content is read lazily on first access. The copy is dirty exactly
/// when `initial_source` is set, which happens on the first real edit.
#[derive(Debug)]
pub struct WorkingCopy {
    path: PathBuf,
    source: Option<String>,
    initial_source: Option<String>,
    relative_target_path: Option<PathBuf>,
    deleted: bool,
    revision: u64,
}

impl WorkingCopy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: None,
            initial_source: None,
            relative_target_path: None,
            deleted: false,
            revision: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current content, read from disk on first access.
    pub fn source(&mut self) -> Result<&str> {
        if self.source.is_none() {
            trace!(path = %self.path.display(), "loading working copy");
            let text = match fs::read_to_string(&self.path) {
                Ok(text) => text,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Err(MigrationError::Parse {
                        path: self.path.clone(),
                        message: "not valid UTF-8 text".to_string(),
                    });
                }
                Err(e) => return Err(e).at(&self.path),
            };
            self.source = Some(text);
        }
        Ok(self.source.as_deref().unwrap_or_default())
    }

    /// Replace the content. Setting the current value is a no-op.
    ///
    /// Returns true if the content changed.
    pub fn set_source(&mut self, text: impl Into<String>) -> Result<bool> {
        let text = text.into();
        let current = self.source()?;
        if current == text {
            return Ok(false);
        }
        if self.initial_source.is_none() {
            self.initial_source = self.source.take();
        }
        self.source = Some(text);
        self.revision += 1;
        Ok(true)
    }

    /// Content before the first edit, if any edit happened.
    pub fn initial_source(&self) -> Option<&str> {
        self.initial_source.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.initial_source.is_some()
    }

    /// Increments on every real edit. Used to invalidate derived caches.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Target-relative destination overriding the source-relative mapping.
    pub fn relative_target_path(&self) -> Option<&Path> {
        self.relative_target_path.as_deref()
    }

    pub fn set_relative_target_path(&mut self, path: impl Into<PathBuf>) {
        self.relative_target_path = Some(path.into());
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Write a dirty copy back to its own path and drop the buffers, so the
    /// next access re-reads the file.
    pub fn store_source(&mut self) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        let text = self.source.take().unwrap_or_default();
        fs::write(&self.path, text).at(&self.path)?;
        self.initial_source = None;
        Ok(true)
    }

    /// Write this copy to `destination`: delete it if marked deleted, write
    /// the edited content if dirty, copy the original bytes otherwise.
    ///
    /// Afterwards the copy is clean.
    pub fn persist(&mut self, destination: &Path) -> Result<Persisted> {
        if self.deleted {
            let outcome = match fs::remove_file(destination) {
                Ok(()) => Persisted::Deleted,
                Err(e) if e.kind() == io::ErrorKind::NotFound => Persisted::Deleted,
                Err(e) => return Err(e).at(destination),
            };
            self.reset();
            return Ok(outcome);
        }
        ensure_parent(destination)?;
        let outcome = if self.is_dirty() {
            let text = self.source.as_deref().unwrap_or_default();
            fs::write(destination, text).at(destination)?;
            Persisted::Written
        } else {
            if self.path != destination {
                fs::copy(&self.path, destination).at(&self.path)?;
            }
            Persisted::Copied
        };
        self.reset();
        Ok(outcome)
    }

    fn reset(&mut self) {
        self.source = None;
        self.initial_source = None;
    }
}

/// What `WorkingCopy::persist` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    Written,
    Copied,
    Deleted,
}
