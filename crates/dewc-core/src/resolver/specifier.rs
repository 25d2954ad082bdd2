//! Specifier resolution.
//!
//! Maps a raw `require`/`import` string, as written in a file of a package,
//! onto the dew name the compiled module uses for it:
//! - relative specifiers (`./`, `../`, `.`) are looked up in the package's
//!   file set and re-expressed relative to the importing file
//! - plain specifiers pass only when they name a declared dependency (or a
//!   prefix of one) or a builtin
//! - local-map targets are always expressed as `name/path`

use super::files::{resolve_dir, resolve_file};
use super::naming::{to_dew, to_dew_plain};
use crate::builtins::is_builtin;
use crate::package::PackageDescriptor;
use crate::paths;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Reason codes for unresolved specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Absolute specifiers are never resolvable.
    AbsoluteSpecifier,
    /// Plain specifier that is neither a declared dependency nor a builtin.
    UndeclaredDependency,
    /// Relative specifier with no matching file or folder main.
    NotFound,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AbsoluteSpecifier => "ABSOLUTE_SPECIFIER",
            Self::UndeclaredDependency => "UNDECLARED_DEPENDENCY",
            Self::NotFound => "NOT_FOUND",
        };
        write!(f, "{s}")
    }
}

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Renamed specifier to emit.
    Resolved(String),
    /// Nothing to emit; the import stays external.
    Unresolved(UnresolvedReason),
}

impl Resolution {
    /// The resolved name, if any.
    #[must_use]
    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Resolved(name) => Some(name),
            Self::Unresolved(_) => None,
        }
    }
}

/// Resolve `specifier` imported from `importer` inside `pkg`.
///
/// Returns `None` when the specifier is excluded or cannot be found.
#[must_use]
pub fn resolve(specifier: &str, importer: &Path, pkg: &PackageDescriptor) -> Option<String> {
    resolve_with_reason(specifier, importer, pkg).into_option()
}

/// Like [`resolve`], but reports why a specifier was left unresolved.
#[must_use]
pub fn resolve_with_reason(specifier: &str, importer: &Path, pkg: &PackageDescriptor) -> Resolution {
    let specifier = if specifier == "." { "./" } else { specifier };

    if specifier.starts_with("./") || specifier.starts_with("../") {
        resolve_relative(specifier, importer, pkg)
    } else {
        resolve_plain(specifier, &pkg.deps)
    }
}

fn resolve_plain(specifier: &str, deps: &HashSet<String>) -> Resolution {
    if specifier.starts_with('/') {
        return Resolution::Unresolved(UnresolvedReason::AbsoluteSpecifier);
    }
    if longest_prefix_match(specifier, deps).is_none() && !is_builtin(specifier) {
        return Resolution::Unresolved(UnresolvedReason::UndeclaredDependency);
    }
    let name = specifier.strip_suffix('/').unwrap_or(specifier);
    Resolution::Resolved(to_dew_plain(name))
}

fn resolve_relative(specifier: &str, importer: &Path, pkg: &PackageDescriptor) -> Resolution {
    let importer_dir = paths::parent_dir(importer);
    let resolved = paths::normalize(&importer_dir.join(specifier));
    let base = paths::normalize(&pkg.base_path);

    // Leaving the package: keep the author's specifier, only rename it.
    if !paths::is_within(&resolved, &base) {
        return Resolution::Resolved(to_dew(specifier));
    }

    let mut pkg_path = paths::relative(&base, &resolved);
    if pkg_path.is_empty() {
        if let Some(main) = &pkg.main {
            pkg_path.clone_from(main);
        }
    }

    let found = resolve_file(&pkg_path, &pkg.files)
        .or_else(|| resolve_dir(&pkg_path, &pkg.files, &pkg.folder_mains));

    // Local maps stay plain so package-level remapping can intercept them.
    let target = found.as_deref().unwrap_or(&pkg_path);
    if pkg.local_maps.contains(target) {
        return Resolution::Resolved(to_dew_plain(&format!("{}/{target}", pkg.name)));
    }

    let Some(found) = found else {
        return Resolution::Unresolved(UnresolvedReason::NotFound);
    };

    let mut rel = paths::relative(&importer_dir, &base.join(&found));
    if rel.is_empty() {
        rel = format!("./{}", paths::basename(&found));
    } else if !rel.starts_with("../") {
        rel = format!("./{rel}");
    }
    Resolution::Resolved(to_dew(&rel))
}

/// Longest `/`-delimited prefix of `path` (including `path` itself) present
/// in `set`.
#[must_use]
pub fn longest_prefix_match<'a>(path: &'a str, set: &HashSet<String>) -> Option<&'a str> {
    let mut end = path.len();
    loop {
        let candidate = &path[..end];
        if set.contains(candidate) {
            return Some(candidate);
        }
        end = candidate.rfind('/')?;
    }
}

/// Resolve every specifier and collect the ones that resolved.
///
/// This is the map handed to the transform step; unresolved specifiers are
/// left out so the transform keeps them as written.
#[must_use]
pub fn resolve_map<I, S>(specifiers: I, importer: &Path, pkg: &PackageDescriptor) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    specifiers
        .into_iter()
        .filter_map(|specifier| {
            let specifier = specifier.as_ref();
            resolve(specifier, importer, pkg).map(|resolved| (specifier.to_string(), resolved))
        })
        .collect()
}
