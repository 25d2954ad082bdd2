//! File and directory resolution against a package's file set.

use super::naming::{BINARY_EXTENSION, DATA_EXTENSION, SOURCE_EXTENSION};
use std::collections::{HashMap, HashSet};

/// Extensions probed after an exact match, in order.
pub const PROBE_EXTENSIONS: &[&str] = &[SOURCE_EXTENSION, DATA_EXTENSION, BINARY_EXTENSION];

/// Resolve `candidate` to a file in `files`.
///
/// An exact match wins; otherwise `.js`, `.json` and `.node` are appended in
/// that order.
#[must_use]
pub fn resolve_file(candidate: &str, files: &HashSet<String>) -> Option<String> {
    if files.contains(candidate) {
        return Some(candidate.to_string());
    }
    PROBE_EXTENSIONS
        .iter()
        .map(|ext| format!("{candidate}{ext}"))
        .find(|path| files.contains(path))
}

/// Resolve `candidate` as a directory through its registered folder main.
#[must_use]
pub fn resolve_dir(
    candidate: &str,
    files: &HashSet<String>,
    folder_mains: &HashMap<String, String>,
) -> Option<String> {
    let main = folder_mains.get(candidate)?;
    resolve_file(&format!("{candidate}/{main}"), files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_set(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let files = file_set(&["lib/a", "lib/a.js"]);
        assert_eq!(resolve_file("lib/a", &files).as_deref(), Some("lib/a"));
    }

    #[test]
    fn test_extension_precedence() {
        let files = file_set(&["a.node", "a.json", "a.js"]);
        assert_eq!(resolve_file("a", &files).as_deref(), Some("a.js"));

        let files = file_set(&["a.node", "a.json"]);
        assert_eq!(resolve_file("a", &files).as_deref(), Some("a.json"));

        let files = file_set(&["a.node"]);
        assert_eq!(resolve_file("a", &files).as_deref(), Some("a.node"));
    }

    #[test]
    fn test_resolve_file_idempotent() {
        let files = file_set(&["lib/a.js", "lib/b.json"]);
        for path in ["lib/a.js", "lib/b.json"] {
            let once = resolve_file(path, &files).unwrap();
            assert_eq!(once, path);
            assert_eq!(resolve_file(&once, &files).unwrap(), once);
        }
    }

    #[test]
    fn test_resolve_file_missing() {
        let files = file_set(&["lib/a.js"]);
        assert_eq!(resolve_file("lib/b", &files), None);
    }

    #[test]
    fn test_resolve_dir_through_folder_main() {
        let files = file_set(&["lib/index.js"]);
        let mains: HashMap<String, String> = [("lib".to_string(), "index".to_string())].into();
        assert_eq!(
            resolve_dir("lib", &files, &mains).as_deref(),
            Some("lib/index.js")
        );
    }

    #[test]
    fn test_resolve_dir_without_folder_main() {
        let files = file_set(&["lib/index.js"]);
        assert_eq!(resolve_dir("lib", &files, &HashMap::new()), None);
    }
}
