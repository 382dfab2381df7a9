use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::event::{CatalogEvent, EventDispatcher, SharedEventDispatcher};
use crate::kernel::constants::{handles_key, ACTIVE_KEY, AVAILABLE_KEY};
use crate::kernel::error::Result;
use crate::plugin_system::bootstrap::BootstrapRegistry;
use crate::plugin_system::dispatcher::LifecycleDispatcher;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::finder::ManifestFinder;
use crate::plugin_system::manifest::PluginDescriptor;
use crate::plugin_system::path::PathTokenizer;
use crate::plugin_system::provider::{ProviderRepository, ServiceRegistrar};
use crate::plugin_system::registry::Extensions;
use crate::plugin_system::route::{RequestFacts, RouteGenerator};
use crate::plugin_system::status::StatusChecker;
use crate::storage::config::{ConfigRepository, ConfigStore};
use crate::storage::memory::{Memory, MemoryProvider};
use crate::storage::provider::StorageProvider;

/// Publishes an extension's assets or migrations
pub trait Publisher: Send + Sync + Debug {
    fn publish(&self, name: &str) -> Result<()>;
}

/// Shared services the catalog and its parts work with
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub config: Arc<dyn ConfigStore>,
    pub events: SharedEventDispatcher,
    pub storage: Arc<dyn StorageProvider>,
    pub memory: Arc<dyn Memory>,
    pub services: Arc<dyn ServiceRegistrar>,
    pub bootstraps: Arc<BootstrapRegistry>,
}

impl Collaborators {
    /// Default collaborators over `storage`, keeping configuration, memory and
    /// services in process
    pub fn in_memory(storage: Arc<dyn StorageProvider>) -> Self {
        Self {
            config: Arc::new(ConfigRepository::new()),
            events: EventDispatcher::shared(),
            storage,
            memory: Arc::new(MemoryProvider::in_memory()),
            services: Arc::new(ProviderRepository::new()),
            bootstraps: Arc::new(BootstrapRegistry::new()),
        }
    }
}

/// Entry point to the extension engine: discovery, activation, lazy boot,
/// routing and shutdown.
#[derive(Debug)]
pub struct PluginCatalog {
    finder: ManifestFinder,
    dispatcher: LifecycleDispatcher,
    status: StatusChecker,
    config: Arc<dyn ConfigStore>,
    events: SharedEventDispatcher,
    storage: Arc<dyn StorageProvider>,
    memory: Arc<dyn Memory>,
    services: Arc<dyn ServiceRegistrar>,
    publishers: Vec<Arc<dyn Publisher>>,
    extensions: Extensions,
    routes: HashMap<String, RouteGenerator>,
    request: RequestFacts,
    public_path: PathBuf,
    booted: bool,
}

impl PluginCatalog {
    pub fn new(
        parts: Collaborators,
        tokenizer: PathTokenizer,
        request: RequestFacts,
        public_path: impl Into<PathBuf>,
    ) -> Self {
        let finder = ManifestFinder::new(Arc::clone(&parts.storage), tokenizer.clone());
        let dispatcher = LifecycleDispatcher::new(
            Arc::clone(&parts.config),
            Arc::clone(&parts.events),
            tokenizer,
            Arc::clone(&parts.services),
            parts.bootstraps,
        );
        let status = StatusChecker::new(Arc::clone(&parts.config), request.mode.as_deref());

        Self {
            finder,
            dispatcher,
            status,
            config: parts.config,
            events: parts.events,
            storage: parts.storage,
            memory: parts.memory,
            services: parts.services,
            publishers: Vec::new(),
            extensions: Extensions::new(),
            routes: HashMap::new(),
            request,
            public_path: public_path.into(),
            booted: false,
        }
    }

    /// Scan the search roots and cache the result under
    /// `extensions.available`.
    ///
    /// The cached entries leave out description, author, url and version; the
    /// returned collection is complete.
    pub fn detect(&self) -> Result<Extensions> {
        self.events.dispatch(&CatalogEvent::Detecting);
        let extensions = self.finder.detect()?;

        let available: Map<String, Value> = extensions
            .iter()
            .map(|descriptor| (descriptor.name.clone(), descriptor.cached_projection()))
            .collect();
        self.memory.put(AVAILABLE_KEY, Value::Object(available))?;

        Ok(extensions)
    }

    /// Register every active extension that is still available.
    ///
    /// The available entry's config is merged under the active entry's. In
    /// safe mode nothing is registered.
    pub fn attach(&mut self) -> Result<()> {
        self.events.dispatch(&CatalogEvent::Attaching);

        if self.status.is_safe() {
            log::warn!("Safe mode: skipping registration of active extensions");
            return Ok(());
        }

        let available = self.memory_map(AVAILABLE_KEY);
        let active = self.memory_map(ACTIVE_KEY);

        for (name, options) in active {
            let Some(entry) = available.get(&name) else {
                log::debug!("Active extension '{}' is no longer available", name);
                continue;
            };
            match merge_entry(&name, entry, &options) {
                Some(descriptor) => self.register(descriptor)?,
                None => log::warn!("Ignoring malformed cache entry for extension '{}'", name),
            }
        }
        Ok(())
    }

    /// Boot the registered extensions once
    pub fn boot(&mut self) {
        if self.booted {
            return;
        }
        self.dispatcher.boot();
        self.booted = true;
        self.events.dispatch(&CatalogEvent::Booted);
        log::info!("Booted {} extension(s)", self.extensions.len());
    }

    /// Route generator for an extension's configured handle, falling back to
    /// `default`. The first call boots the catalog when that has not happened
    /// yet; generators are memoized per name.
    pub fn route(&mut self, name: &str, default: &str) -> Result<&RouteGenerator> {
        if !self.booted {
            self.services.load_manifest()?;
            self.attach()?;
            self.boot();
        }

        let config = &self.config;
        let request = &self.request;
        let generator = self.routes.entry(name.to_string()).or_insert_with(|| {
            let handles = config
                .get_string(&handles_key(name))
                .unwrap_or_else(|| default.to_string());
            RouteGenerator::new(&handles, request.clone())
        });
        Ok(generator)
    }

    /// Whether the extension's public assets can be published.
    ///
    /// `false` only when the extension has a `public` directory and its
    /// target below `<public>/packages` is not writable.
    pub fn permission(&self, name: &str) -> bool {
        let base = self
            .memory
            .get(&format!("{}.{}.path", AVAILABLE_KEY, name))
            .and_then(|value| value.as_str().map(String::from))
            .unwrap_or_else(|| name.to_string());
        let path = self
            .finder
            .resolve_extension_path(&format!("{}/public", base.trim_end_matches('/')));

        self.is_writable_with_asset(name, Path::new(&path))
    }

    fn is_writable_with_asset(&self, name: &str, path: &Path) -> bool {
        let packages = self.public_path.join("packages");
        let mut target = packages.join(name);

        if name.contains('/') && !self.storage.is_dir(&target) {
            let vendor = name.split('/').next().unwrap_or(name);
            target = packages.join(vendor);
        }

        let writable = self.storage.is_writable(&target);
        if self.storage.is_dir(path) && !writable {
            log::debug!("Asset target {} for '{}' is not writable", target.display(), name);
            return false;
        }
        true
    }

    /// Run every publisher for an extension, then announce it
    pub fn publish(&self, name: &str) -> Result<()> {
        for publisher in &self.publishers {
            publisher.publish(name)?;
        }
        self.events.dispatch(&CatalogEvent::Publishing { name: name.to_string() });
        Ok(())
    }

    /// Finish every registered extension and forget the live collection
    pub fn finish(&mut self) {
        for descriptor in self.extensions.iter() {
            self.dispatcher.finish(descriptor);
        }
        log::info!("Finished {} extension(s)", self.extensions.len());
        self.extensions.clear();
        self.booted = false;
    }

    /// Mark an available extension active, register it and publish it
    pub fn activate(&mut self, name: &str) -> Result<()> {
        let available = self.memory_map(AVAILABLE_KEY);
        let Some(entry) = available.get(name) else {
            return Err(PluginSystemError::UnknownExtension { name: name.to_string() }.into());
        };

        let mut active = self.memory_map(ACTIVE_KEY);
        active.insert(name.to_string(), entry.clone());
        self.memory.put(ACTIVE_KEY, Value::Object(active))?;
        log::info!("Activated extension '{}'", name);

        let descriptor = PluginDescriptor::from_value(entry.clone()).ok_or_else(|| {
            PluginSystemError::UnknownExtension { name: name.to_string() }
        })?;
        self.register(descriptor)?;
        self.publish(name)
    }

    /// Remove an extension from the active list. Returns whether it was
    /// active. A registration made earlier in this process stands until
    /// [`finish`](Self::finish).
    pub fn deactivate(&mut self, name: &str) -> Result<bool> {
        let mut active = self.memory_map(ACTIVE_KEY);
        if active.shift_remove(name).is_none() {
            return Ok(false);
        }
        self.memory.put(ACTIVE_KEY, Value::Object(active))?;
        log::info!("Deactivated extension '{}'", name);
        Ok(true)
    }

    /// Whether the extension is in the active list
    pub fn activated(&self, name: &str) -> bool {
        self.memory_map(ACTIVE_KEY).contains_key(name)
    }

    /// Whether the extension was found by the last detection
    pub fn available(&self, name: &str) -> bool {
        self.memory_map(AVAILABLE_KEY).contains_key(name)
    }

    /// Whether the extension was registered in this process
    pub fn started(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Dotted option of a registered extension
    pub fn option(&self, name: &str, key: &str) -> Option<Value> {
        self.extensions.get(name).and_then(|descriptor| descriptor.option(key))
    }

    /// Registered descriptor by name
    pub fn get(&self, name: &str) -> Option<&Arc<PluginDescriptor>> {
        self.extensions.get(name)
    }

    /// Extensions registered in this process, in registration order
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    pub fn add_publisher(&mut self, publisher: Arc<dyn Publisher>) {
        self.publishers.push(publisher);
    }

    pub fn finder(&self) -> &ManifestFinder {
        &self.finder
    }

    /// Mutable access to the finder, to add search paths
    pub fn finder_mut(&mut self) -> &mut ManifestFinder {
        &mut self.finder
    }

    pub fn dispatcher(&self) -> &LifecycleDispatcher {
        &self.dispatcher
    }

    pub fn status(&self) -> &StatusChecker {
        &self.status
    }

    pub fn events(&self) -> &SharedEventDispatcher {
        &self.events
    }

    fn register(&mut self, descriptor: PluginDescriptor) -> Result<()> {
        let descriptor = Arc::new(descriptor);
        self.extensions.insert(Arc::clone(&descriptor));
        self.dispatcher.register(descriptor)
    }

    fn memory_map(&self, key: &str) -> Map<String, Value> {
        match self.memory.get(key) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Descriptor for an active extension: its cached available entry with the
/// active entry laid over it, configs merged key by key
fn merge_entry(name: &str, available: &Value, active: &Value) -> Option<PluginDescriptor> {
    let mut options = available.as_object()?.clone();
    let mut config = config_of(available);

    if let Some(active) = active.as_object() {
        for (key, value) in active {
            options.insert(key.clone(), value.clone());
        }
    }
    config.extend(config_of(active));

    options.insert("name".to_string(), Value::String(name.to_string()));
    options.insert("config".to_string(), Value::Object(config));
    PluginDescriptor::from_value(Value::Object(options))
}

fn config_of(entry: &Value) -> Map<String, Value> {
    entry
        .get("config")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
