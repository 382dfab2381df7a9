#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::{tempdir, TempDir};

use crate::event::{Event, EventDispatcher};
use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;
use crate::kernel::settings::Settings;
use crate::plugin_system::catalog::Publisher;
use crate::plugin_system::route::RequestFacts;

// ===== TEST SITE =====

/// A throwaway installation: `app/`, `vendor/`, `workbench/` and `public/`
/// below a temporary base directory
pub struct TestSite {
    dir: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("app")).expect("Failed to create app dir");
        fs::create_dir_all(dir.path().join("public")).expect("Failed to create public dir");
        Self { dir }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `orchestra.json` into `dir` (relative to the base)
    pub fn manifest(&self, dir: &str, content: &str) -> &Self {
        let directory = self.path(dir);
        fs::create_dir_all(&directory).expect("Failed to create extension dir");
        fs::write(directory.join("orchestra.json"), content).expect("Failed to write manifest");
        self
    }

    pub fn settings(&self) -> Settings {
        Settings::with_base(self.base())
    }

    /// Fresh application over this site, sharing the persisted memory with
    /// every other application built from it
    pub fn application(&self, request: RequestFacts) -> Application {
        Application::new(self.settings(), request).expect("Failed to build application")
    }
}

// ===== EVENT TRACKING =====

/// Records `name[:scope]` for every event it listens to
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn attach(events: &EventDispatcher, names: &[&'static str]) -> Self {
        let log = Self::default();
        for &name in names {
            let entries = Arc::clone(&log.entries);
            events.listen(name, move |event: &dyn Event| {
                let entry = match event.scope() {
                    Some(scope) => format!("{}:{}", event.name(), scope),
                    None => event.name().to_string(),
                };
                entries.lock().unwrap().push(entry);
            });
        }
        log
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

// ===== PUBLISHERS =====

/// Publisher that copies nothing and only remembers what it was asked for
#[derive(Debug, Default)]
pub struct TrackingPublisher {
    published: Mutex<Vec<String>>,
}

impl TrackingPublisher {
    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

impl Publisher for TrackingPublisher {
    fn publish(&self, name: &str) -> Result<()> {
        self.published.lock().unwrap().push(name.to_string());
        Ok(())
    }
}
