//! Path predicates used to select which files a walk hands out

use std::collections::HashSet;
use std::path::PathBuf;

use glob::Pattern;

use crate::error::{MigrationError, Result};
use crate::path_info::PathInfo;

/// A pure predicate over a `PathInfo`.
pub trait PathFilter {
    fn test(&self, info: &PathInfo) -> bool;
}

impl<F> PathFilter for F
where
    F: Fn(&PathInfo) -> bool,
{
    fn test(&self, info: &PathInfo) -> bool {
        self(info)
    }
}

/// Conversions available on every filter.
pub trait PathFilterExt: PathFilter + Sized {
    fn boxed(self) -> Box<dyn PathFilter>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<F: PathFilter> PathFilterExt for F {}

/// Matches files whose module-relative path lies below `prefix`.
pub fn under(prefix: impl Into<PathBuf>) -> impl PathFilter + 'static {
    let prefix = prefix.into();
    move |info: &PathInfo| info.is_under(&prefix)
}

/// Matches files whose module-relative path is one of `paths`.
pub fn one_of<I>(paths: I) -> RelativeSet
where
    I: IntoIterator,
    I::Item: Into<PathBuf>,
{
    RelativeSet(paths.into_iter().map(Into::into).collect())
}

/// Fixed set of module-relative paths.
#[derive(Debug, Clone, Default)]
pub struct RelativeSet(HashSet<PathBuf>);

impl PathFilter for RelativeSet {
    fn test(&self, info: &PathInfo) -> bool {
        info.module_relative().is_some_and(|rel| self.0.contains(rel))
    }
}

/// Glob over the file name, or over the relative path if the pattern has a `/`.
#[derive(Debug, Clone)]
pub struct GlobFilter {
    pattern: Pattern,
    whole_path: bool,
}

impl GlobFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|e| {
            MigrationError::Configuration(format!("invalid glob pattern '{}': {}", pattern, e))
        })?;
        Ok(Self {
            pattern: compiled,
            whole_path: pattern.contains('/'),
        })
    }
}

impl PathFilter for GlobFilter {
    fn test(&self, info: &PathInfo) -> bool {
        if self.whole_path {
            info.module_relative()
                .is_some_and(|rel| self.pattern.matches_path(rel))
        } else {
            info.file_name().is_some_and(|name| self.pattern.matches(name))
        }
    }
}
