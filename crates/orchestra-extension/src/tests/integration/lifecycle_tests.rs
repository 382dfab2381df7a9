#![cfg(test)]

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::kernel::error::Error;
use crate::plugin_system::bootstrap::BootstrapContext;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::route::RequestFacts;

use super::common::{EventLog, TestSite, TrackingPublisher};

const LIFECYCLE_EVENTS: [&str; 7] = [
    "orchestra.extension.detecting",
    "orchestra.extension.attaching",
    "orchestra.extension.booted",
    "orchestra.publishing",
    "extension.started",
    "extension.booted",
    "extension.done",
];

fn blog_site() -> TestSite {
    let site = TestSite::new();
    site.manifest(
        "vendor/acme/blog",
        r#"{
            "config": {"handles": "blog"},
            "autoload": ["src/routes.rs"],
            "provide": ["Acme\\Blog\\BlogServiceProvider"]
        }"#,
    )
    .manifest("app", r#"{"config": {"handles": "/"}}"#);
    site
}

#[test]
fn test_full_request_lifecycle() {
    let site = blog_site();

    // First request: an administrator activates the blog
    {
        let mut app = site.application(RequestFacts::new("http://localhost/laravel", ""));
        let publisher = Arc::new(TrackingPublisher::default());
        app.catalog_mut().add_publisher(publisher.clone());

        app.catalog().detect().expect("detect should succeed");
        app.catalog_mut().activate("acme/blog").expect("activate should succeed");
        assert_eq!(publisher.published(), vec!["acme/blog"]);
        app.terminate();
    }

    // Second request: routing boots the active extensions lazily
    let mut app = site.application(RequestFacts::new("http://localhost/laravel", "blog/posts/1"));
    let log = EventLog::attach(app.events(), &LIFECYCLE_EVENTS);

    let slots = Arc::new(Mutex::new(Vec::new()));
    for slot in ["vendor/acme/blog/src/routes.rs", "vendor/acme/blog/orchestra.rs"] {
        let seen = Arc::clone(&slots);
        app.bootstraps()
            .register(site.path(slot), move |context: &BootstrapContext<'_>| {
                seen.lock().unwrap().push(format!("{}:{}", context.name, context.path.display()));
                Ok(())
            });
    }

    let route = app.catalog_mut().route("acme/blog", "acme/blog").expect("route should resolve");
    assert_eq!(route.root(), "http://localhost/laravel/blog");
    assert_eq!(route.to("posts/1?page=2"), "http://localhost/laravel/blog/posts/1?page=2");
    assert!(route.is("posts/*"));
    assert_eq!(route.relative_path(), "posts/1");

    assert_eq!(
        *slots.lock().unwrap(),
        vec![
            format!("acme/blog:{}", site.path("vendor/acme/blog/src/routes.rs").display()),
            format!("acme/blog:{}", site.path("vendor/acme/blog/orchestra.rs").display()),
        ]
    );

    app.terminate();
    assert_eq!(
        log.entries(),
        vec![
            "orchestra.extension.attaching",
            "extension.started:acme/blog",
            "extension.booted:acme/blog",
            "orchestra.extension.booted",
            "extension.done:acme/blog",
        ]
    );
}

#[test]
fn test_services_are_replayed_from_manifest() {
    let site = blog_site();
    {
        let mut app = site.application(RequestFacts::default());
        app.catalog().detect().expect("detect should succeed");
        app.catalog_mut().activate("acme/blog").expect("activate should succeed");
    }

    let services_file = std::fs::read_to_string(site.path("storage/services.json")).expect("services persisted");
    let services: Vec<String> = serde_json::from_str(&services_file).expect("services are JSON");
    assert_eq!(services, vec!["Acme\\Blog\\BlogServiceProvider"]);

    let mut app = site.application(RequestFacts::default());
    app.catalog_mut().route("app", "/").expect("route should resolve");
    assert!(app.catalog().started("acme/blog"));
}

#[test]
fn test_handle_override_from_settings() {
    let site = blog_site();
    {
        let mut app = site.application(RequestFacts::default());
        app.catalog().detect().expect("detect should succeed");
        app.catalog_mut().activate("acme/blog").expect("activate should succeed");
    }

    // The active cache entry wins over the settings override once attached
    let mut settings = site.settings();
    settings.handles.insert("acme/blog".to_string(), json!("//blog.{{domain}}"));
    settings.handles.insert("acme/shop".to_string(), json!("//shop.{{domain}}/store"));
    let mut app = crate::kernel::bootstrap::Application::new(settings, RequestFacts::new("https://example.test", ""))
        .expect("app should build");

    let blog = app.catalog_mut().route("acme/blog", "acme/blog").expect("route").root();
    assert_eq!(blog, "https://example.test/blog");

    let shop = app.catalog_mut().route("acme/shop", "acme/shop").expect("route");
    assert_eq!(shop.domain(false).as_deref(), Some("shop.example.test"));
    assert_eq!(shop.root(), "https://shop.example.test/store");
}

#[test]
fn test_failing_bootstrap_surfaces_from_activate() {
    let site = blog_site();
    let mut app = site.application(RequestFacts::default());
    app.bootstraps()
        .register(site.path("vendor/acme/blog/orchestra.rs"), |_: &BootstrapContext<'_>| {
            Err(Error::from("database unavailable"))
        });

    app.catalog().detect().expect("detect should succeed");
    let result = app.catalog_mut().activate("acme/blog");

    match result {
        Err(Error::PluginSystem(PluginSystemError::BootstrapExecutionFailure { plugin_id, source, .. })) => {
            assert_eq!(plugin_id, "acme/blog");
            assert_eq!(source.to_string(), "Error: database unavailable");
        }
        other => panic!("Expected BootstrapExecutionFailure, got {:?}", other),
    }
    // Activation is recorded before the extension starts
    assert!(app.catalog().activated("acme/blog"));
    assert!(app.catalog().started("acme/blog"));
}

#[test]
fn test_safe_mode_request_boots_nothing() {
    let site = blog_site();
    {
        let mut app = site.application(RequestFacts::default());
        app.catalog().detect().expect("detect should succeed");
        app.catalog_mut().activate("acme/blog").expect("activate should succeed");
    }

    let mut app = site.application(RequestFacts::new("http://localhost", "blog").with_mode("safe"));
    let log = EventLog::attach(app.events(), &LIFECYCLE_EVENTS);

    let route = app.catalog_mut().route("acme/blog", "acme/blog").expect("route should resolve");
    // Nothing republished the handle, so the default applies
    assert_eq!(route.prefix(false), "acme/blog");

    assert!(app.catalog().is_booted());
    assert!(app.catalog().extensions().is_empty());
    assert_eq!(
        log.entries(),
        vec!["orchestra.extension.attaching", "orchestra.extension.booted"]
    );
}
