//! Dew naming convention.
//!
//! A compiled module for `lib/a.js` lives at `lib/a.dew.js`; a bare package
//! import points at the package's compiled entry, `pkg/index.dew.js`.
//! Builtins and native binaries keep their names since they are never
//! recompiled.

use crate::builtins::is_builtin;
use regex_lite::Regex;
use std::sync::OnceLock;

/// Source file extension.
pub const SOURCE_EXTENSION: &str = ".js";
/// Data file extension.
pub const DATA_EXTENSION: &str = ".json";
/// Native binary module extension.
pub const BINARY_EXTENSION: &str = ".node";
/// Double extension of compiled dew modules.
pub const DEW_EXTENSION: &str = ".dew.js";

/// Sentinel specifier for the empty module.
pub const EMPTY_MODULE: &str = "@empty";
/// Reserved name the empty module compiles to.
pub const EMPTY_MODULE_DEW: &str = "@empty.dew";

/// Entry point appended to bare package names.
const PACKAGE_ENTRY: &str = "/index.dew.js";

/// Exact package name: optional `@scope/`, then a name, no subpath.
const PACKAGE_NAME_PATTERN: &str = r"^(@[-_.A-Za-z0-9]+/)?[-_.A-Za-z0-9]+$";

fn package_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PACKAGE_NAME_PATTERN).expect("package name pattern is valid"))
}

/// Check whether `name` is a syntactically valid bare package name.
#[must_use]
pub fn is_valid_package_name(name: &str) -> bool {
    package_name_regex().is_match(name)
}

/// Rename a path to its dew module name.
///
/// `a.js` becomes `a.dew.js`, `a.node` is kept, anything else gains `.dew.js`.
#[must_use]
pub fn to_dew(path: &str) -> String {
    if let Some(stem) = path.strip_suffix(SOURCE_EXTENSION) {
        return format!("{stem}{DEW_EXTENSION}");
    }
    if path.ends_with(BINARY_EXTENSION) {
        return path.to_string();
    }
    format!("{path}{DEW_EXTENSION}")
}

/// Rename a plain (package-qualified) specifier.
#[must_use]
pub fn to_dew_plain(path: &str) -> String {
    if path == EMPTY_MODULE {
        return EMPTY_MODULE_DEW.to_string();
    }
    if !is_valid_package_name(path) {
        return to_dew(path);
    }
    if is_builtin(path) {
        return path.to_string();
    }
    format!("{path}{PACKAGE_ENTRY}")
}
