//! Package metadata consumed by the resolver.
//!
//! A [`PackageDescriptor`] is an immutable snapshot produced by the external
//! package-metadata loader. Relative paths inside it are forward-slash
//! normalized with no leading `./`; the resolver does no normalization of its
//! own.

use crate::error::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Static metadata for one package.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    /// Root directory of the package.
    pub base_path: PathBuf,
    /// Package name, used for local-map specifiers.
    pub name: String,
    /// Entry point relative to `base_path`.
    #[serde(default)]
    pub main: Option<String>,
    /// Relative paths of every file in the package.
    #[serde(default, deserialize_with = "deserialize_key_set")]
    pub files: HashSet<String>,
    /// Directory → file name that serves as the directory's entry point.
    #[serde(default)]
    pub folder_mains: HashMap<String, String>,
    /// Paths that must be addressed by their package-qualified name.
    #[serde(default, deserialize_with = "deserialize_key_set")]
    pub local_maps: HashSet<String>,
    /// Declared dependency names.
    #[serde(default, deserialize_with = "deserialize_key_set")]
    pub deps: HashSet<String>,
}

impl PackageDescriptor {
    /// Create an empty descriptor rooted at `base_path`.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the package entry point.
    #[must_use]
    pub fn with_main(mut self, main: impl Into<String>) -> Self {
        self.main = Some(main.into());
        self
    }

    /// Add files known to exist.
    #[must_use]
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Register `file` as the entry point of directory `dir`.
    #[must_use]
    pub fn with_folder_main(mut self, dir: impl Into<String>, file: impl Into<String>) -> Self {
        self.folder_mains.insert(dir.into(), file.into());
        self
    }

    /// Add local-map paths.
    #[must_use]
    pub fn with_local_maps<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.local_maps.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add declared dependency names.
    #[must_use]
    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Load a descriptor snapshot from a JSON file.
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::DescriptorRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::DescriptorParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The dependency sections of a package manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Names of all declared dependencies: direct and peer, plus optional ones
/// when `include_optional` is set.
#[must_use]
pub fn dependency_set(manifest: &PackageManifest, include_optional: bool) -> HashSet<String> {
    let mut deps: HashSet<String> = manifest
        .dependencies
        .keys()
        .chain(manifest.peer_dependencies.keys())
        .cloned()
        .collect();
    if include_optional {
        deps.extend(manifest.optional_dependencies.keys().cloned());
    }
    deps
}

/// Accepts either `["a", "b"]` or `{"a": true, "b": true}`.
///
/// Object entries whose value is `false` or `null` are left out.
fn deserialize_key_set<'de, D>(deserializer: D) -> Result<HashSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KeySet {
        List(Vec<String>),
        Map(HashMap<String, serde_json::Value>),
    }

    Ok(match KeySet::deserialize(deserializer)? {
        KeySet::List(list) => list.into_iter().collect(),
        KeySet::Map(map) => map
            .into_iter()
            .filter(|(_, v)| !matches!(v, serde_json::Value::Bool(false) | serde_json::Value::Null))
            .map(|(k, _)| k)
            .collect(),
    })
}
