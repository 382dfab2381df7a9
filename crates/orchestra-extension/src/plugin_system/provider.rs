use std::fmt::{self, Debug};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::provider::StorageProvider;

/// Registers the service providers extensions declare under `provide`
pub trait ServiceRegistrar: Send + Sync + Debug {
    /// Register a batch of services, in order
    fn provides(&self, services: &[String]) -> Result<()>;

    /// Load the cached service manifest, if any
    fn load_manifest(&self) -> Result<()>;

    /// Services registered so far, in registration order
    fn registered(&self) -> Vec<String>;
}

type ServiceHook = Arc<dyn Fn(&str) -> Result<()> + Send + Sync>;

/// Default [`ServiceRegistrar`].
///
/// Records every provided service once and hands it to the registered hooks.
/// When given a manifest path the list is persisted, and
/// [`load_manifest`](ServiceRegistrar::load_manifest) replays it.
#[derive(Default)]
pub struct ProviderRepository {
    services: RwLock<Vec<String>>,
    hooks: RwLock<Vec<ServiceHook>>,
    manifest: Option<(Arc<dyn StorageProvider>, PathBuf)>,
}

impl ProviderRepository {
    /// In-process repository without a manifest file
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository persisting its service list to `path`
    pub fn with_manifest(storage: Arc<dyn StorageProvider>, path: impl Into<PathBuf>) -> Self {
        Self {
            manifest: Some((storage, path.into())),
            ..Self::default()
        }
    }

    /// Call `hook` for every service registered from now on
    pub fn on_provide<F>(&self, hook: F)
    where
        F: Fn(&str) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    fn register_one(&self, service: &str) -> Result<bool> {
        {
            let mut services = self.services.write().unwrap_or_else(PoisonError::into_inner);
            if services.iter().any(|existing| existing == service) {
                return Ok(false);
            }
            services.push(service.to_string());
        }

        let hooks: Vec<ServiceHook> = self.hooks.read().unwrap_or_else(PoisonError::into_inner).clone();
        for hook in hooks {
            hook(service)?;
        }
        log::debug!("Registered service provider '{}'", service);
        Ok(true)
    }

    fn write_manifest(&self) -> Result<()> {
        if let Some((storage, path)) = &self.manifest {
            let services = self.registered();
            let content = serde_json::to_string_pretty(&services)
                .map_err(|e| StorageSystemError::SerializationError {
                    format: "json".to_string(),
                    source: Box::new(e),
                })?;
            storage.write_string(path, &content)?;
        }
        Ok(())
    }
}

impl ServiceRegistrar for ProviderRepository {
    fn provides(&self, services: &[String]) -> Result<()> {
        let mut added = false;
        for service in services {
            added |= self.register_one(service)?;
        }
        if added {
            self.write_manifest()?;
        }
        Ok(())
    }

    fn load_manifest(&self) -> Result<()> {
        let Some((storage, path)) = &self.manifest else {
            return Ok(());
        };
        if !storage.is_file(path) {
            log::debug!("No service manifest at {}", path.display());
            return Ok(());
        }

        let content = storage.read_to_string(path)?;
        let services: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            StorageSystemError::DeserializationError {
                format: "json".to_string(),
                source: Box::new(e),
            }
        })?;
        for service in &services {
            self.register_one(service)?;
        }
        log::debug!("Loaded {} service(s) from {}", services.len(), path.display());
        Ok(())
    }

    fn registered(&self) -> Vec<String> {
        self.services.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl fmt::Debug for ProviderRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRepository")
            .field("services", &self.registered())
            .field("manifest", &self.manifest.as_ref().map(|(_, path)| path))
            .finish_non_exhaustive()
    }
}
