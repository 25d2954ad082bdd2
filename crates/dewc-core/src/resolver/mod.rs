//! Dew specifier resolver.
//!
//! Relative specifiers are resolved against the package's file set and
//! re-expressed relative to the importing file; plain specifiers are checked
//! against declared dependencies and builtins. Both are then renamed to the
//! dew naming convention.

mod classify;
mod files;
pub mod naming;
mod specifier;

pub use classify::is_native_module;
pub use files::{resolve_dir, resolve_file, PROBE_EXTENSIONS};
pub use naming::{is_valid_package_name, to_dew, to_dew_plain};
pub use specifier::{
    longest_prefix_match, resolve, resolve_map, resolve_with_reason, Resolution,
    UnresolvedReason,
};
