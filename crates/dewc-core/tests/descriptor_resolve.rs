//! Resolution against descriptor snapshots loaded from disk.

use dewc_core::{
    dependency_set, is_native_module, resolve, resolve_with_reason, PackageDescriptor,
    PackageManifest, Resolution, UnresolvedReason,
};
use std::path::Path;
use tempfile::tempdir;

fn load(json: &str) -> PackageDescriptor {
    let dir = tempdir().unwrap();
    let path = dir.path().join("descriptor.json");
    std::fs::write(&path, json).unwrap();
    PackageDescriptor::load_file(&path).unwrap()
}

#[test]
fn test_object_form_descriptor() {
    let pkg = load(
        r#"{
            "basePath": "/pkg",
            "name": "demo",
            "files": { "lib/index.js": true, "a.js": true, "gone.js": false },
            "folderMains": { "lib": "index" },
            "deps": { "lodash": true }
        }"#,
    );

    assert_eq!(
        resolve("./lib", Path::new("/pkg/a.js"), &pkg).as_deref(),
        Some("./lib/index.dew.js")
    );
    assert_eq!(resolve("./gone", Path::new("/pkg/a.js"), &pkg), None);
    assert_eq!(
        resolve("lodash/fp", Path::new("/pkg/a.js"), &pkg).as_deref(),
        Some("lodash/fp.dew.js")
    );
}

#[test]
fn test_builtin_without_dependency() {
    let pkg = load(r#"{ "basePath": "/pkg", "name": "demo" }"#);

    assert!(is_native_module("fs", Some(&pkg.deps)));
    assert_eq!(resolve("fs", Path::new("/pkg/a.js"), &pkg).as_deref(), Some("fs"));
}

#[test]
fn test_manifest_drives_declared_deps() {
    let manifest: PackageManifest = serde_json::from_str(
        r#"{
            "dependencies": { "a": "1" },
            "peerDependencies": { "b": "1" },
            "optionalDependencies": { "c": "1" }
        }"#,
    )
    .unwrap();
    let mut pkg = PackageDescriptor::new("/pkg", "demo");

    pkg.deps = dependency_set(&manifest, false);
    assert_eq!(
        resolve_with_reason("c", Path::new("/pkg/a.js"), &pkg),
        Resolution::Unresolved(UnresolvedReason::UndeclaredDependency)
    );

    pkg.deps = dependency_set(&manifest, true);
    assert_eq!(
        resolve("c", Path::new("/pkg/a.js"), &pkg).as_deref(),
        Some("c/index.dew.js")
    );
}
