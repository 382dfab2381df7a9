#![cfg(test)]

use std::fs;

use serde_json::json;

use crate::kernel::error::Error;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::route::RequestFacts;

use super::common::TestSite;

#[test]
fn test_detects_every_root_in_order() {
    let site = TestSite::new();
    site.manifest("app", r#"{"config": {"handles": "/"}}"#)
        .manifest("vendor/acme/shop", "{}")
        .manifest("vendor/acme/blog", r#"{"version": "^1.0"}"#)
        .manifest("workbench/dev/tools", r#"{"path": "app::Tools"}"#)
        // Not a vendor/package directory
        .manifest("vendor/loose", "{}");

    let app = site.application(RequestFacts::default());
    let extensions = app.catalog().detect().expect("detect should succeed");

    assert_eq!(extensions.names(), vec!["app", "acme/blog", "acme/shop", "dev/tools"]);
    assert_eq!(
        extensions.get("dev/tools").map(|d| (d.path.clone(), d.source_path.clone())),
        Some(("app::Tools".to_string(), "workbench::dev/tools".to_string()))
    );
}

#[test]
fn test_available_list_survives_restart() {
    let site = TestSite::new();
    site.manifest("vendor/acme/blog", r#"{"description": "Blog", "config": {"handles": "blog"}}"#);

    {
        let app = site.application(RequestFacts::default());
        app.catalog().detect().expect("detect should succeed");
    }

    let restarted = site.application(RequestFacts::default());
    assert!(restarted.catalog().available("acme/blog"));
    assert_eq!(
        restarted.memory().get("extensions.available.acme/blog.config"),
        Some(json!({"handles": "blog"}))
    );
    // Display fields are never cached
    assert_eq!(restarted.memory().get("extensions.available.acme/blog.description"), None);
}

#[test]
fn test_removed_extension_is_not_attached() {
    let site = TestSite::new();
    site.manifest("vendor/acme/blog", "{}").manifest("vendor/acme/shop", "{}");

    {
        let mut app = site.application(RequestFacts::default());
        app.catalog().detect().expect("detect should succeed");
        app.catalog_mut().activate("acme/blog").expect("activate blog");
        app.catalog_mut().activate("acme/shop").expect("activate shop");
    }

    fs::remove_dir_all(site.path("vendor/acme/blog")).expect("remove blog");

    let mut app = site.application(RequestFacts::default());
    app.catalog().detect().expect("detect should succeed");
    app.catalog_mut().attach().expect("attach should succeed");

    assert!(app.catalog().activated("acme/blog"));
    assert!(!app.catalog().available("acme/blog"));
    assert_eq!(app.catalog().extensions().names(), vec!["acme/shop"]);
}

#[test]
fn test_reserved_vendor_aborts_detection_and_keeps_cache() {
    let site = TestSite::new();
    site.manifest("vendor/acme/blog", "{}");

    let app = site.application(RequestFacts::default());
    app.catalog().detect().expect("first detect should succeed");

    site.manifest("vendor/orchestra/foundation", "{}");
    let result = app.catalog().detect();

    assert!(matches!(
        result,
        Err(Error::PluginSystem(PluginSystemError::ReservedNameViolation { ref name })) if name == "orchestra/foundation"
    ));
    assert!(app.catalog().available("acme/blog"));
}

#[test]
fn test_duplicate_across_roots_prefers_later_root() {
    let site = TestSite::new();
    site.manifest("vendor/acme/blog", r#"{"config": {"handles": "vendor-blog"}}"#)
        .manifest("workbench/acme/blog", r#"{"config": {"handles": "bench-blog"}}"#)
        .manifest("vendor/acme/shop", "{}");

    let app = site.application(RequestFacts::default());
    let extensions = app.catalog().detect().expect("detect should succeed");

    assert_eq!(extensions.names(), vec!["acme/blog", "acme/shop"]);
    assert_eq!(
        app.memory().get("extensions.available.acme/blog.source-path"),
        Some(json!("workbench::acme/blog"))
    );
}
