use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{JsClass, JsEnum, JsFile, JsUtility};

/// Result of recognizing a file: the structure plus lines that looked like
/// definitions but matched no known form.
#[derive(Debug, Clone, Default)]
pub struct Recognized {
    pub file: JsFile,
    pub warnings: Vec<String>,
}

static HEADER_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\*+$").expect("HEADER_START regex is invalid"));

static HEADER_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*+/$").expect("HEADER_END regex is invalid"));

// scout.Device = function(model) {
static CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w$]+)\.([\w$]+)\s*=\s*function\s*\(([^)]*)\)\s*\{")
        .expect("CONSTRUCTOR regex is invalid")
});

// scout.KeyStroke.Mode = {
static NESTED_ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w$]+)\.([\w$]+)\.([A-Z][\w$]*)\s*=\s*\{")
        .expect("NESTED_ENUM regex is invalid")
});

// scout.TreeVisitResult = {
static TOP_LEVEL_ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w$]+)\.([A-Z][\w$]*)\s*=\s*\{").expect("TOP_LEVEL_ENUM regex is invalid")
});

// scout.strings = {
static UTILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w$]+)\.([_$a-z][\w$]*)\s*=\s*\{").expect("UTILITY regex is invalid")
});

// scout.Widget.prototype.render = function(   or   scout.Widget.create = function(
static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w$]+)\.[\w$]+(\.prototype)?\.[\w$]+\s*=").expect("MEMBER regex is invalid")
});

pub(super) fn recognize(source: &str, namespace: &str) -> Recognized {
    let mut out = Recognized::default();
    let lines: Vec<&str> = source.lines().collect();
    out.file.header_end = header_end(&lines);

    for (idx, line) in lines.iter().enumerate().skip(out.file.header_end) {
        if !line.starts_with(namespace) {
            continue;
        }
        if let Some(caps) = CONSTRUCTOR.captures(line) {
            if &caps[1] == namespace {
                out.file.classes.push(JsClass {
                    namespace: caps[1].to_string(),
                    name: caps[2].to_string(),
                    line: idx,
                });
            }
            continue;
        }
        if let Some(caps) = NESTED_ENUM.captures(line) {
            if &caps[1] == namespace {
                out.file.enums.push(JsEnum {
                    namespace: caps[1].to_string(),
                    owner: Some(caps[2].to_string()),
                    name: caps[3].to_string(),
                    line: idx,
                });
            }
            continue;
        }
        if let Some(caps) = TOP_LEVEL_ENUM.captures(line) {
            if &caps[1] == namespace {
                out.file.enums.push(JsEnum {
                    namespace: caps[1].to_string(),
                    owner: None,
                    name: caps[2].to_string(),
                    line: idx,
                });
            }
            continue;
        }
        if let Some(caps) = UTILITY.captures(line) {
            if &caps[1] == namespace {
                out.file.utilities.push(JsUtility {
                    namespace: caps[1].to_string(),
                    name: caps[2].to_string(),
                    line: idx,
                });
            }
            continue;
        }
        if MEMBER.is_match(line) {
            continue;
        }
        let prefix = format!("{}.", namespace);
        if line.starts_with(&prefix) && line.contains('=') && !line.contains("==") {
            out.warnings.push(format!(
                "unrecognized top-level definition at line {}: {}",
                idx + 1,
                line.trim()
            ));
        }
    }
    out
}

/// Index of the first line after a leading block comment, or 0.
fn header_end(lines: &[&str]) -> usize {
    match lines.first() {
        Some(first) if HEADER_START.is_match(first) => {}
        _ => return 0,
    }
    lines
        .iter()
        .position(|l| HEADER_END.is_match(l))
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Names `X` referenced as `namespace.X` with an uppercase first letter.
pub fn references(source: &str, namespace: &str) -> BTreeSet<String> {
    let pattern = format!(r"\b{}\.([A-Z][\w$]*)", regex::escape(namespace));
    let Ok(re) = Regex::new(&pattern) else {
        return BTreeSet::new();
    };
    re.captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGET: &str = "/*
 * Copyright (c) 2019
 */
scout.Widget = function() {
  this.parent = null;
};

scout.Widget.DisabledStyle = {
  DEFAULT: 0
};

scout.Widget.prototype.render = function($parent) {
};

scout.Widget.create = function(model) {
};
";

    #[test]
    fn test_recognize_class_enum_and_header() {
        let r = recognize(WIDGET, "scout");
        assert_eq!(r.file.header_end, 3);
        assert_eq!(r.file.classes.len(), 1);
        assert_eq!(r.file.classes[0].name, "Widget");
        assert_eq!(r.file.classes[0].line, 3);
        assert_eq!(r.file.enums.len(), 1);
        assert_eq!(r.file.enums[0].qualified_name(), "Widget.DisabledStyle");
        assert!(r.warnings.is_empty(), "{:?}", r.warnings);
    }

    #[test]
    fn test_recognize_utility_and_top_level_enum() {
        let src = "scout.strings = {\n  nvl: function() {}\n};\nscout.TreeVisitResult = {\n  CONTINUE: 0\n};\n";
        let r = recognize(src, "scout");
        assert_eq!(r.file.utilities.len(), 1);
        assert_eq!(r.file.utilities[0].name, "strings");
        assert_eq!(r.file.enums.len(), 1);
        assert_eq!(r.file.enums[0].owner, None);
        assert_eq!(r.file.header_end, 0);
    }

    #[test]
    fn test_other_namespace_is_ignored() {
        let r = recognize("crm.Widget = function() {\n};\n", "scout");
        assert!(r.file.is_empty());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_unrecognized_definition_warns() {
        let r = recognize("scout.VERSION = '1.0';\n", "scout");
        assert!(r.file.is_empty());
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].contains("line 1"));
    }

    #[test]
    fn test_references() {
        let src = "var a = new scout.Widget();\nscout.strings.nvl(scout.Action.TYPE);\nxscout.Nope";
        let refs: Vec<_> = references(src, "scout").into_iter().collect();
        assert_eq!(refs, vec!["Action", "Widget"]);
    }
}
