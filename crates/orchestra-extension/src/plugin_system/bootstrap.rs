//! Bootstrap callbacks.
//!
//! Starting an extension probes a list of bootstrap slots (its autoload
//! entries, then `src/orchestra.rs` and `orchestra.rs` below its source
//! directory). A slot does something only when a callback was registered for
//! its resolved absolute path.
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::event::SharedEventDispatcher;
use crate::kernel::error::Result;
use crate::plugin_system::manifest::PluginDescriptor;
use crate::plugin_system::provider::ServiceRegistrar;
use crate::storage::config::ConfigStore;

/// Everything a bootstrap may touch while its extension starts
pub struct BootstrapContext<'a> {
    pub name: &'a str,
    pub descriptor: &'a Arc<PluginDescriptor>,
    /// Resolved slot path the bootstrap was registered under
    pub path: &'a Path,
    pub config: &'a Arc<dyn ConfigStore>,
    pub events: &'a SharedEventDispatcher,
    pub services: &'a Arc<dyn ServiceRegistrar>,
}

impl fmt::Debug for BootstrapContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapContext")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Code run when an extension starts
pub trait Bootstrap: Send + Sync {
    fn run(&self, context: &BootstrapContext<'_>) -> Result<()>;
}

impl<F> Bootstrap for F
where
    F: Fn(&BootstrapContext<'_>) -> Result<()> + Send + Sync,
{
    fn run(&self, context: &BootstrapContext<'_>) -> Result<()> {
        self(context)
    }
}

/// Bootstrap callbacks keyed by absolute slot path
#[derive(Default)]
pub struct BootstrapRegistry {
    entries: RwLock<HashMap<PathBuf, Arc<dyn Bootstrap>>>,
}

impl BootstrapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for a slot path, replacing any previous callback
    pub fn register<F>(&self, path: impl AsRef<Path>, bootstrap: F)
    where
        F: Fn(&BootstrapContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.register_bootstrap(path, Arc::new(bootstrap));
    }

    /// Register a bootstrap object for a slot path
    pub fn register_bootstrap(&self, path: impl AsRef<Path>, bootstrap: Arc<dyn Bootstrap>) {
        let key = normalize(path.as_ref());
        log::debug!("Registered bootstrap for {}", key.display());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, bootstrap);
    }

    /// Callback registered for a slot path
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<dyn Bootstrap>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize(path.as_ref()))
            .cloned()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.get(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for BootstrapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapRegistry")
            .field("entries_count", &self.len())
            .finish()
    }
}

// Collecting the components drops doubled separators and `.` segments
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}
