//! Whether a resolved target stays an external module rather than a dew
//! module.

use super::naming::BINARY_EXTENSION;
use crate::builtins::is_builtin;
use std::collections::HashSet;

/// Check whether a resolved name stays external to the dew build.
///
/// Native binaries are always external. A builtin name is external unless
/// the package declares a dependency of the same name, which shadows it.
#[must_use]
pub fn is_native_module(resolved: &str, deps: Option<&HashSet<String>>) -> bool {
    if resolved.ends_with(BINARY_EXTENSION) {
        return true;
    }
    is_builtin(resolved) && !deps.is_some_and(|deps| deps.contains(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_native() {
        assert!(is_native_module("fs", Some(&HashSet::new())));
        assert!(is_native_module("fs", None));
    }

    #[test]
    fn test_shadowed_builtin_is_not_native() {
        let deps: HashSet<String> = ["events".to_string()].into();
        assert!(!is_native_module("events", Some(&deps)));
    }

    #[test]
    fn test_binary_is_native() {
        let deps: HashSet<String> = ["addon.node".to_string()].into();
        assert!(is_native_module("./build/addon.node", Some(&deps)));
    }

    #[test]
    fn test_empty_module_is_native() {
        assert!(is_native_module("@empty.dew", None));
        assert!(is_native_module("@empty.dew", Some(&HashSet::new())));
    }

    #[test]
    fn test_dew_module_is_not_native() {
        assert!(!is_native_module("./lib/a.dew.js", None));
        assert!(!is_native_module("lodash/index.dew.js", None));
    }
}
