//! Lexical path helpers.
//!
//! Resolution never touches the filesystem, so `.` and `..` are folded purely
//! on path components. Results that leave this module as specifier text
//! always use forward slashes.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by removing `.` and folding `..` components.
///
/// A `..` that cannot be folded is kept when the path is relative and dropped
/// when it would climb above the root.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Directory containing `file`, normalized.
#[must_use]
pub fn parent_dir(file: &Path) -> PathBuf {
    normalize(&file.join(".."))
}

/// Check whether `path` is `base` or lies beneath it.
///
/// Both inputs are normalized first; the comparison is component-wise, so
/// `/pkg-other` is not inside `/pkg`.
#[must_use]
pub fn is_within(path: &Path, base: &Path) -> bool {
    normalize(path).starts_with(normalize(base))
}

/// Forward-slash path from directory `from` to `to`.
///
/// Returns an empty string when both denote the same location.
#[must_use]
pub fn relative(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in &from_parts[common..] {
        segments.push("..".to_string());
    }
    for part in &to_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }
    segments.join("/")
}

/// Final `/`-separated segment of a relative path.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rfind('/').map_or(path, |idx| &path[idx + 1..])
}
