#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Core library for dewc.
//!
//! Maps the import specifiers of a CommonJS package onto the names its
//! compiled "dew" modules use to reference each other. Everything here is
//! pure: resolution only consults the [`PackageDescriptor`] snapshot it is
//! given, never the filesystem.

pub mod builtins;
pub mod config;
pub mod error;
pub mod package;
pub mod paths;
pub mod resolver;
pub mod version;

pub use config::Config;
pub use error::Error;
pub use package::{dependency_set, PackageDescriptor, PackageManifest};
pub use resolver::{
    is_native_module, longest_prefix_match, resolve, resolve_dir, resolve_file, resolve_map,
    resolve_with_reason, to_dew, to_dew_plain, Resolution, UnresolvedReason,
};
pub use version::VERSION;
