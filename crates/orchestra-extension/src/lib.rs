pub mod event;
pub mod kernel;
pub mod plugin_system;
pub mod storage;

// Re-export key public types/traits for easier use by the binary and embedders
pub use kernel::{Application, Settings};
pub use kernel::error::Error as KernelError;
pub use plugin_system::{
    BootstrapContext, BootstrapRegistry, Extensions, ManifestFinder, PathTokenizer, PluginCatalog,
    PluginDescriptor, RequestFacts, RouteGenerator,
};
pub use plugin_system::error::PluginSystemError;
pub use event::{Event, EventDispatcher, ExtensionEvent, LifecycleStage};
pub use storage::{ConfigStore, Memory, StorageProvider};

#[cfg(test)]
mod tests;
