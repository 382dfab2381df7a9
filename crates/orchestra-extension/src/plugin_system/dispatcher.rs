use std::path::PathBuf;
use std::sync::Arc;

use crate::event::{ExtensionEvent, LifecycleStage, SharedEventDispatcher};
use crate::kernel::constants::{handles_key, BOOTSTRAP_FILE_NAME};
use crate::kernel::error::Result;
use crate::plugin_system::bootstrap::{BootstrapContext, BootstrapRegistry};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::PluginDescriptor;
use crate::plugin_system::path::{PathTokenizer, RootKind};
use crate::plugin_system::provider::ServiceRegistrar;
use crate::plugin_system::registry::Extensions;
use crate::storage::config::ConfigStore;

/// Drives registered extensions through start, boot and finish
#[derive(Debug)]
pub struct LifecycleDispatcher {
    config: Arc<dyn ConfigStore>,
    events: SharedEventDispatcher,
    tokenizer: PathTokenizer,
    services: Arc<dyn ServiceRegistrar>,
    bootstraps: Arc<BootstrapRegistry>,
    extensions: Extensions,
}

impl LifecycleDispatcher {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        events: SharedEventDispatcher,
        tokenizer: PathTokenizer,
        services: Arc<dyn ServiceRegistrar>,
        bootstraps: Arc<BootstrapRegistry>,
    ) -> Self {
        Self {
            config,
            events,
            tokenizer,
            services,
            bootstraps,
            extensions: Extensions::new(),
        }
    }

    /// Register an extension and start it right away.
    ///
    /// Publishes `config.handles` to the extension's handle key, forwards the
    /// declared services, and records the descriptor (replacing a previous
    /// one with the same name in place). The registration stands even when
    /// starting fails.
    pub fn register(&mut self, descriptor: Arc<PluginDescriptor>) -> Result<()> {
        let name = descriptor.name.clone();

        if let Some(handles) = descriptor.handles().filter(|handles| !handles.is_null()) {
            self.config.set(&handles_key(&name), handles.clone());
        }

        if !descriptor.provide.is_empty() {
            self.services.provides(&descriptor.provide)?;
        }

        self.extensions.insert(Arc::clone(&descriptor));
        log::info!("Registered extension '{}'", name);

        self.start(&descriptor)
    }

    /// Run every bootstrap slot of an extension in order, then fire
    /// [`LifecycleStage::Started`]. A failing bootstrap aborts the sequence.
    pub fn start(&self, descriptor: &Arc<PluginDescriptor>) -> Result<()> {
        let tokenizer = self.tokenizer.with_source(&descriptor.source_path);

        for entry in Self::extension_paths(descriptor) {
            let path = PathBuf::from(tokenizer.resolve(&entry));
            let Some(bootstrap) = self.bootstraps.get(&path) else {
                continue;
            };

            log::debug!("Running bootstrap {} for '{}'", path.display(), descriptor.name);
            let context = BootstrapContext {
                name: &descriptor.name,
                descriptor,
                path: &path,
                config: &self.config,
                events: &self.events,
                services: &self.services,
            };
            bootstrap.run(&context).map_err(|source| PluginSystemError::BootstrapExecutionFailure {
                plugin_id: descriptor.name.clone(),
                path: path.clone(),
                source: Box::new(source),
            })?;
        }

        self.fire(LifecycleStage::Started, descriptor);
        Ok(())
    }

    /// Fire [`LifecycleStage::Booted`] for every registered extension, in
    /// registration order. Each call fires again.
    pub fn boot(&self) {
        for descriptor in self.extensions.iter() {
            self.fire(LifecycleStage::Booted, descriptor);
        }
    }

    /// Fire [`LifecycleStage::Done`] for an extension. The registration is
    /// left untouched.
    pub fn finish(&self, descriptor: &Arc<PluginDescriptor>) {
        self.fire(LifecycleStage::Done, descriptor);
    }

    /// Bootstrap slots of an extension, still symbolic: its autoload entries
    /// (relative ones anchored on `source-path::`) followed by the two
    /// default bootstrap files.
    pub fn extension_paths(descriptor: &PluginDescriptor) -> Vec<String> {
        let source = RootKind::SourcePath.token();
        descriptor
            .autoload
            .iter()
            .map(|entry| {
                if entry.contains("::") {
                    entry.clone()
                } else {
                    format!("{}{}", source, entry.trim_start_matches('/'))
                }
            })
            .chain([
                format!("{}src/{}", source, BOOTSTRAP_FILE_NAME),
                format!("{}{}", source, BOOTSTRAP_FILE_NAME),
            ])
            .collect()
    }

    /// Registered extensions, in registration order
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    pub fn tokenizer(&self) -> &PathTokenizer {
        &self.tokenizer
    }

    fn fire(&self, stage: LifecycleStage, descriptor: &Arc<PluginDescriptor>) {
        log::debug!("Extension '{}' {}", descriptor.name, stage);
        let event = ExtensionEvent::new(stage, Arc::clone(descriptor));
        self.events.dispatch(&event);
    }
}
