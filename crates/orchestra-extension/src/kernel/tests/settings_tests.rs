use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::tempdir;

use crate::kernel::error::Error;
use crate::kernel::settings::Settings;
use crate::storage::error::StorageSystemError;

#[test]
fn test_defaults() {
    let settings = Settings::default();

    assert_eq!(settings.base_path, PathBuf::from("."));
    assert_eq!(settings.root_url, "http://localhost");
    assert!(settings.paths.is_empty());
    assert!(settings.handles.is_empty());
    assert_eq!(settings.mode, None);
}

#[test]
fn test_derived_paths() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut settings = Settings::with_base(dir.path());
    settings.public_path = Some(PathBuf::from("web/"));
    settings.memory_file = Some(PathBuf::from("/var/lib/orchestra/memory.json"));

    let base = settings.base().expect("base");
    assert_eq!(base, dir.path());
    assert_eq!(settings.app().expect("app"), dir.path().join("app"));
    assert_eq!(settings.public().expect("public"), dir.path().join("web"));
    assert_eq!(
        settings.memory().expect("memory"),
        PathBuf::from("/var/lib/orchestra/memory.json")
    );
    assert_eq!(
        settings.services().expect("services"),
        dir.path().join("storage/services.json")
    );
}

#[test]
fn test_search_paths_are_anchored_on_base() {
    let mut settings = Settings::with_base("/srv/site");
    settings.paths = vec!["modules/*/*".to_string(), "/opt/extensions/*/".to_string()];

    assert_eq!(
        settings.search_paths().expect("search paths"),
        vec!["/srv/site/modules/*/*/", "/opt/extensions/*/"]
    );
}

#[test]
fn test_load_json_resolves_base_against_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("orchestra.json");
    fs::write(
        &file,
        r#"{
            "base_path": "site",
            "mode": "safe",
            "paths": ["modules/*/*/"],
            "handles": {"acme/blog": "//blog.{{domain}}"},
            "root_url": "https://example.test"
        }"#,
    )
    .expect("Failed to write settings");

    let settings = Settings::load(&file).expect("settings should load");

    assert_eq!(settings.base_path, dir.path().join("site"));
    assert_eq!(settings.mode.as_deref(), Some("safe"));
    assert_eq!(settings.handles.get("acme/blog"), Some(&json!("//blog.{{domain}}")));
    assert_eq!(settings.root_url, "https://example.test");
    assert_eq!(settings.app_path, None);
}

#[cfg(feature = "toml-config")]
#[test]
fn test_load_toml() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("orchestra.toml");
    fs::write(
        &file,
        r#"
base_path = "/srv/site"
app_path = "src/app"
paths = ["plugins/*/"]

[handles]
"acme/blog" = "blog"
"#,
    )
    .expect("Failed to write settings");

    let settings = Settings::load(&file).expect("settings should load");

    assert_eq!(settings.base_path, PathBuf::from("/srv/site"));
    assert_eq!(settings.app().expect("app"), PathBuf::from("/srv/site/src/app"));
    assert_eq!(settings.paths, vec!["plugins/*/"]);
    assert_eq!(settings.handles.get("acme/blog"), Some(&json!("blog")));
}

#[test]
fn test_load_errors() {
    let dir = tempdir().expect("Failed to create temp dir");

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        Settings::load(&missing),
        Err(Error::StorageSystem(StorageSystemError::FileNotFound(_)))
    ));

    let unsupported = dir.path().join("orchestra.ini");
    fs::write(&unsupported, "base_path = x").expect("Failed to write settings");
    assert!(matches!(
        Settings::load(&unsupported),
        Err(Error::StorageSystem(StorageSystemError::UnsupportedConfigFormat(_)))
    ));

    let wrong_type = dir.path().join("wrong.json");
    fs::write(&wrong_type, r#"{"paths": "not a list"}"#).expect("Failed to write settings");
    assert!(matches!(
        Settings::load(&wrong_type),
        Err(Error::StorageSystem(StorageSystemError::DeserializationError { .. }))
    ));
}
