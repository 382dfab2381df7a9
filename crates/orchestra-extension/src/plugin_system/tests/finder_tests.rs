use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tempfile::{tempdir, TempDir};

use crate::kernel::error::Error;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::finder::ManifestFinder;
use crate::plugin_system::path::PathTokenizer;
use crate::storage::local::LocalStorageProvider;

fn write_manifest(base: &Path, dir: &str, content: &str) -> PathBuf {
    let directory = base.join(dir);
    fs::create_dir_all(&directory).expect("Failed to create extension dir");
    let manifest = directory.join("orchestra.json");
    fs::write(&manifest, content).expect("Failed to write manifest");
    manifest
}

fn finder(base: &Path) -> ManifestFinder {
    let storage = Arc::new(LocalStorageProvider::new(base.to_path_buf()));
    ManifestFinder::new(storage, PathTokenizer::new(base.join("app"), base))
}

fn fixture() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");
    write_manifest(dir.path(), "app", r#"{"config": {"handles": "/"}}"#);
    write_manifest(
        dir.path(),
        "vendor/acme/blog",
        r#"{"description": "Blog", "version": "^1.0", "config": {"handles": "blog"}, "autoload": ["src/boot.rs"]}"#,
    );
    write_manifest(dir.path(), "vendor/acme/shop", "{}");
    write_manifest(dir.path(), "workbench/dev/tools", r#"{"path": "app::Tools/"}"#);
    dir
}

#[test]
fn test_default_search_paths() {
    let dir = tempdir().expect("Failed to create temp dir");
    let finder = finder(dir.path());
    let base = dir.path().to_string_lossy();

    assert_eq!(
        finder.paths(),
        &[
            format!("{}/app/", base),
            format!("{}/vendor/*/*/", base),
            format!("{}/workbench/*/*/", base),
        ]
    );
}

#[test]
fn test_detect_in_search_order() {
    let dir = fixture();
    let extensions = finder(dir.path()).detect().expect("detect should succeed");

    assert_eq!(extensions.names(), vec!["app", "acme/blog", "acme/shop", "dev/tools"]);

    let app = extensions.get("app").expect("app detected");
    assert_eq!(app.path, "app::");
    assert_eq!(app.source_path, "app::");

    let blog = extensions.get("acme/blog").expect("blog detected");
    assert_eq!(blog.source_path, "vendor::acme/blog");
    assert_eq!(blog.path, "vendor::acme/blog");
    assert_eq!(blog.version, "^1.0");
    assert_eq!(blog.handles(), Some(&json!("blog")));
    assert_eq!(blog.autoload, vec!["src/boot.rs"]);

    let shop = extensions.get("acme/shop").expect("shop detected");
    assert_eq!(shop.version, ">0");
    assert!(shop.config.is_empty());

    let tools = extensions.get("dev/tools").expect("tools detected");
    assert_eq!(tools.source_path, "workbench::dev/tools");
    assert_eq!(tools.path, "app::Tools");
}

#[test]
fn test_missing_roots_detect_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let extensions = finder(dir.path()).detect().expect("detect should succeed");
    assert!(extensions.is_empty());
}

#[test]
fn test_duplicate_name_keeps_position_and_later_manifest() {
    let dir = fixture();
    write_manifest(dir.path(), "workbench/acme/blog", r#"{"config": {"handles": "journal"}}"#);

    let extensions = finder(dir.path()).detect().expect("detect should succeed");

    assert_eq!(extensions.names(), vec!["app", "acme/blog", "acme/shop", "dev/tools"]);
    let blog = extensions.get("acme/blog").expect("blog detected");
    assert_eq!(blog.source_path, "workbench::acme/blog");
    assert_eq!(blog.handles(), Some(&json!("journal")));
}

#[test]
fn test_reserved_name_fails_detection() {
    let dir = fixture();
    write_manifest(dir.path(), "vendor/orchestra/extension", "{}");

    match finder(dir.path()).detect() {
        Err(Error::PluginSystem(PluginSystemError::ReservedNameViolation { name })) => {
            assert_eq!(name, "orchestra/extension");
        }
        other => panic!("Expected ReservedNameViolation, got {:?}", other),
    }
}

#[test]
fn test_undecodable_manifest_names_its_file() {
    let dir = fixture();
    let broken = write_manifest(dir.path(), "vendor/acme/broken", "{ not json");

    match finder(dir.path()).detect() {
        Err(Error::PluginSystem(PluginSystemError::ManifestDecodeViolation { path, .. })) => {
            assert_eq!(path, broken);
        }
        other => panic!("Expected ManifestDecodeViolation, got {:?}", other),
    }
}

#[test]
fn test_empty_array_containers_are_detected() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_manifest(dir.path(), "vendor/acme/blog", r#"{"config": [], "autoload": [], "provide": []}"#);

    let extensions = finder(dir.path()).detect().expect("detect should succeed");
    let blog = extensions.get("acme/blog").expect("acme/blog detected");

    assert!(blog.config.is_empty());
    assert!(blog.autoload.is_empty());
    assert!(blog.provide.is_empty());
    assert_eq!(blog.handles(), None);
}

#[test]
fn test_directory_named_like_manifest_is_skipped() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::create_dir_all(dir.path().join("app/orchestra.json")).expect("Failed to create dir");
    write_manifest(dir.path(), "vendor/acme/shop", "{}");

    let extensions = finder(dir.path()).detect().expect("detect should succeed");

    assert_eq!(extensions.len(), 1);
    assert!(extensions.get("app").is_none());
}

#[test]
fn test_add_path_extends_search() {
    let dir = fixture();
    write_manifest(dir.path(), "modules/extra/reports", r#"{"provide": ["Reports"]}"#);

    let mut finder = finder(dir.path());
    let pattern = format!("{}/modules/*/*/", dir.path().to_string_lossy());
    finder.add_path(pattern.clone()).add_path(pattern);
    assert_eq!(finder.paths().len(), 4);

    let extensions = finder.detect().expect("detect should succeed");
    assert_eq!(extensions.names().last().map(String::as_str), Some("extra/reports"));

    let reports = extensions.get("extra/reports").expect("reports detected");
    assert_eq!(reports.source_path, "base::modules/extra/reports");
    assert_eq!(
        finder.resolve_extension_path(&reports.source_path),
        format!("{}/modules/extra/reports", dir.path().to_string_lossy())
    );
}

#[test]
fn test_resolve_extension_namespace() {
    assert_eq!(
        ManifestFinder::resolve_extension_namespace(Path::new("/srv/vendor/acme/blog/orchestra.json")),
        (Some("acme".to_string()), Some("blog".to_string()))
    );
    // "a/b/orchestra.json" leaves only two fragments
    assert_eq!(
        ManifestFinder::resolve_extension_namespace(Path::new("a/b/orchestra.json")),
        (None, None)
    );
    assert_eq!(
        ManifestFinder::resolve_extension_namespace(Path::new("x/a/b/orchestra.json")),
        (Some("a".to_string()), Some("b".to_string()))
    );
}

#[test]
fn test_guess_extension_name_and_path() {
    let dir = tempdir().expect("Failed to create temp dir");
    let finder = finder(dir.path());

    let app_manifest = dir.path().join("app").join("orchestra.json");
    assert_eq!(
        finder.guess_extension_name(&app_manifest).expect("app name"),
        Some("app".to_string())
    );
    assert_eq!(finder.guess_extension_path(&app_manifest), "app::");

    let vendor_manifest = dir.path().join("vendor/acme/blog/orchestra.json");
    assert_eq!(
        finder.guess_extension_name(&vendor_manifest).expect("vendor name"),
        Some("acme/blog".to_string())
    );
    assert_eq!(finder.guess_extension_path(&vendor_manifest), "vendor::acme/blog");

    assert_eq!(
        finder.guess_extension_name(Path::new("a/orchestra.json")).expect("short path"),
        None
    );
}
