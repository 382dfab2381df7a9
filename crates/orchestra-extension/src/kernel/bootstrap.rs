use std::sync::Arc;

use serde_json::Value;

use crate::event::{EventDispatcher, SharedEventDispatcher};
use crate::kernel::constants::{self, handles_key, mode_key};
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::kernel::settings::Settings;
use crate::plugin_system::bootstrap::BootstrapRegistry;
use crate::plugin_system::catalog::{Collaborators, PluginCatalog};
use crate::plugin_system::path::PathTokenizer;
use crate::plugin_system::provider::ProviderRepository;
use crate::plugin_system::route::RequestFacts;
use crate::storage::config::{ConfigRepository, ConfigStore};
use crate::storage::local::LocalStorageProvider;
use crate::storage::memory::{Memory, MemoryProvider};
use crate::storage::provider::StorageProvider;

/// Main application struct wiring the extension engine together
#[derive(Debug)]
pub struct Application {
    settings: Settings,
    config: Arc<dyn ConfigStore>,
    events: SharedEventDispatcher,
    memory: Arc<dyn Memory>,
    bootstraps: Arc<BootstrapRegistry>,
    catalog: PluginCatalog,
    terminated: bool,
}

impl Application {
    /// Build the default collaborators from `settings`: local storage below
    /// the base path, a file-backed memory, and a configuration store seeded
    /// with the configured mode and handle overrides.
    pub fn new(settings: Settings, request: RequestFacts) -> Result<Self> {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);

        let bootstrap_error = |source: Error| Error::KernelLifecycleError {
            phase: KernelLifecyclePhase::Bootstrap,
            message: "Failed to prepare extension collaborators".to_string(),
            source: Some(Box::new(source)),
        };

        let base = settings.base().map_err(bootstrap_error)?;
        let storage: Arc<dyn StorageProvider> = Arc::new(LocalStorageProvider::new(base.clone()));

        let config = Arc::new(ConfigRepository::new());
        if let Some(mode) = &settings.mode {
            config.set(&mode_key(), Value::String(mode.clone()));
        }
        for (name, handles) in &settings.handles {
            config.set(&handles_key(name), handles.clone());
        }

        let memory_file = settings.memory().map_err(bootstrap_error)?;
        let memory = Arc::new(MemoryProvider::open(Arc::clone(&storage), memory_file).map_err(bootstrap_error)?);
        log::debug!("Using memory file {:?}", memory.path());

        let services_file = settings.services().map_err(bootstrap_error)?;
        let services = Arc::new(ProviderRepository::with_manifest(Arc::clone(&storage), services_file));

        let parts = Collaborators {
            config,
            events: EventDispatcher::shared(),
            storage,
            memory,
            services,
            bootstraps: Arc::new(BootstrapRegistry::new()),
        };
        Self::with_collaborators(settings, request, parts)
    }

    /// Build the application around caller-supplied collaborators
    pub fn with_collaborators(settings: Settings, request: RequestFacts, parts: Collaborators) -> Result<Self> {
        let base = settings.base()?;
        let app = settings.app()?;
        let public = settings.public()?;
        log::info!("Using base path {}", base.display());

        let tokenizer = PathTokenizer::new(&app, &base);
        let config = Arc::clone(&parts.config);
        let events = Arc::clone(&parts.events);
        let memory = Arc::clone(&parts.memory);
        let bootstraps = Arc::clone(&parts.bootstraps);

        let mut catalog = PluginCatalog::new(parts, tokenizer, request, public);
        for pattern in settings.search_paths()? {
            catalog.finder_mut().add_path(pattern);
        }

        Ok(Self {
            settings,
            config,
            events,
            memory,
            bootstraps,
            catalog,
            terminated: false,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PluginCatalog {
        &mut self.catalog
    }

    pub fn config(&self) -> &Arc<dyn ConfigStore> {
        &self.config
    }

    pub fn events(&self) -> &SharedEventDispatcher {
        &self.events
    }

    pub fn memory(&self) -> &Arc<dyn Memory> {
        &self.memory
    }

    /// Registry bootstrap callbacks are added to before extensions start
    pub fn bootstraps(&self) -> &Arc<BootstrapRegistry> {
        &self.bootstraps
    }

    /// Shutdown hook: finish every registered extension. Only the first call
    /// has an effect.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        log::info!("Terminating {}", constants::APP_NAME);
        self.catalog.finish();
        self.terminated = true;
    }
}
