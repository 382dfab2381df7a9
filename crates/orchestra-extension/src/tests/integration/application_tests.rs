#![cfg(test)]

use std::fs;

use serde_json::json;

use crate::kernel::bootstrap::Application;
use crate::kernel::settings::Settings;
use crate::plugin_system::route::RequestFacts;

use super::common::{EventLog, TestSite};

#[test]
fn test_application_from_settings_file() {
    let site = TestSite::new();
    site.manifest("modules/acme/reports", r#"{"config": {"handles": "reports"}}"#);
    let settings_file = site.path("orchestra.json");
    fs::write(
        &settings_file,
        r#"{
            "base_path": ".",
            "memory_file": "var/memory.json",
            "paths": ["modules/*/*"],
            "root_url": "http://intranet.test/portal"
        }"#,
    )
    .expect("Failed to write settings");

    let settings = Settings::load(&settings_file).expect("settings should load");
    let request = RequestFacts::new(&settings.root_url, "reports/daily");
    let mut app = Application::new(settings, request).expect("app should build");

    let extensions = app.catalog().detect().expect("detect should succeed");
    assert_eq!(extensions.names(), vec!["acme/reports"]);
    assert!(site.path("var/memory.json").is_file());

    app.catalog_mut().activate("acme/reports").expect("activate should succeed");
    let route = app.catalog_mut().route("acme/reports", "reports").expect("route should resolve");
    assert_eq!(route.root(), "http://intranet.test/portal/reports");
    assert!(route.is("daily"));
}

#[test]
fn test_configured_safe_mode() {
    let site = TestSite::new();
    site.manifest("vendor/acme/blog", "{}");
    {
        let mut app = site.application(RequestFacts::default());
        app.catalog().detect().expect("detect should succeed");
        app.catalog_mut().activate("acme/blog").expect("activate should succeed");
    }

    let mut settings = site.settings();
    settings.mode = Some("safe".to_string());
    let mut app = Application::new(settings, RequestFacts::default()).expect("app should build");
    app.catalog_mut().attach().expect("attach should succeed");

    assert!(app.catalog().status().is_safe());
    assert!(!app.catalog().started("acme/blog"));
    assert_eq!(app.config().get("orchestra/extension::mode"), Some(json!("safe")));
}

#[test]
fn test_request_mode_overrides_settings() {
    let site = TestSite::new();
    let mut settings = site.settings();
    settings.mode = Some("safe".to_string());

    let app = Application::new(settings, RequestFacts::default().with_mode("normal")).expect("app should build");

    assert!(!app.catalog().status().is_safe());
    assert_eq!(app.config().get("orchestra/extension::mode"), Some(json!("normal")));
}

#[test]
fn test_terminate_without_boot_still_finishes_registered() {
    let site = TestSite::new();
    site.manifest("app", "{}");

    let mut app = site.application(RequestFacts::default());
    let log = EventLog::attach(app.events(), &["extension.started", "extension.done"]);
    app.catalog().detect().expect("detect should succeed");
    app.catalog_mut().activate("app").expect("activate should succeed");
    app.terminate();

    assert_eq!(log.entries(), vec!["extension.started:app", "extension.done:app"]);
    log.clear();

    app.terminate();
    assert!(log.entries().is_empty());
}
