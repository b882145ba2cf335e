//! Lightweight recognition of legacy namespace-style JavaScript
//!
//! This is not a parser. Top-level definitions of the form
//! `ns.Name = function(...) {`, `ns.Name.Kind = {` and `ns.name = {` are
//! picked out line by line, which is all the tasks need to know which
//! symbols a file defines and where its copyright header ends.

mod js;

pub use js::{references, Recognized};

use serde::{Deserialize, Serialize};

/// A constructor function `ns.Name = function(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsClass {
    pub namespace: String,
    pub name: String,
    /// Zero-based line of the definition
    pub line: usize,
}

/// An object literal enum, `ns.Owner.Kind = {` or `ns.Kind = {`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsEnum {
    pub namespace: String,
    pub owner: Option<String>,
    pub name: String,
    pub line: usize,
}

impl JsEnum {
    /// `Owner.Kind` or `Kind`.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// A utility object `ns.strings = {`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsUtility {
    pub namespace: String,
    pub name: String,
    pub line: usize,
}

/// Recognized top-level structure of one JavaScript file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsFile {
    pub classes: Vec<JsClass>,
    pub enums: Vec<JsEnum>,
    pub utilities: Vec<JsUtility>,
    /// Index of the first line after a leading `/* ... */` header (0 if none)
    pub header_end: usize,
}

impl JsFile {
    pub fn recognize(source: &str, namespace: &str) -> Recognized {
        js::recognize(source, namespace)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.enums.is_empty() && self.utilities.is_empty()
    }

    /// True if this file defines a class called `name`.
    pub fn defines_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.name == name)
    }
}
