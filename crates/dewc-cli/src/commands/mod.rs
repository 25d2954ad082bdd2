pub mod compile;
pub mod resolve;
pub mod version;
pub mod worker;

use dewc_core::{dependency_set, paths, Config, PackageDescriptor, PackageManifest};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

/// Make `path` absolute against the configured working directory.
pub fn absolute(config: &Config, path: &Path) -> PathBuf {
    paths::normalize(&config.cwd.join(path))
}

/// Load a package descriptor snapshot.
///
/// A relative `basePath` is taken relative to the descriptor file. When a
/// `package.json` is given, its declared dependencies replace the
/// descriptor's `deps`.
pub fn load_package(
    config: &Config,
    descriptor: &Path,
    manifest: Option<&Path>,
) -> Result<PackageDescriptor> {
    let descriptor = absolute(config, descriptor);
    let mut pkg = PackageDescriptor::load_file(&descriptor).into_diagnostic()?;

    if pkg.base_path.is_relative() {
        pkg.base_path = paths::normalize(&paths::parent_dir(&descriptor).join(&pkg.base_path));
    }

    if let Some(manifest) = manifest {
        let manifest = absolute(config, manifest);
        let content = std::fs::read_to_string(&manifest)
            .map_err(|e| miette::miette!("Failed to read {}: {}", manifest.display(), e))?;
        let manifest: PackageManifest = serde_json::from_str(&content)
            .map_err(|e| miette::miette!("Failed to parse {}: {}", manifest.display(), e))?;
        pkg.deps = dependency_set(&manifest, config.include_optional);
    }

    Ok(pkg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_package_relative_base_path() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        std::fs::write(
            dir.path().join("descriptor.json"),
            r#"{"basePath": "pkg", "name": "demo", "files": ["index.js"]}"#,
        )
        .unwrap();

        let config = Config::new(dir.path().to_path_buf());
        let pkg = load_package(&config, Path::new("descriptor.json"), None).unwrap();

        assert_eq!(pkg.base_path, dir.path().join("pkg"));
        assert!(pkg.files.contains("index.js"));
    }

    #[test]
    fn test_load_package_manifest_replaces_deps() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("descriptor.json"),
            r#"{"basePath": "/pkg", "name": "demo", "deps": ["stale"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"a": "1"}, "optionalDependencies": {"b": "1"}}"#,
        )
        .unwrap();

        let config = Config::new(dir.path().to_path_buf()).with_include_optional(true);
        let pkg = load_package(
            &config,
            Path::new("descriptor.json"),
            Some(Path::new("package.json")),
        )
        .unwrap();

        assert!(pkg.deps.contains("a"));
        assert!(pkg.deps.contains("b"));
        assert!(!pkg.deps.contains("stale"));
    }

    #[test]
    fn test_load_package_missing_descriptor() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf());
        assert!(load_package(&config, Path::new("nope.json"), None).is_err());
    }
}
