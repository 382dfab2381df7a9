//! # Orchestra Extension Storage
//!
//! Filesystem primitives ([`StorageProvider`], [`LocalStorageProvider`]),
//! the runtime configuration store ([`ConfigStore`], [`ConfigRepository`])
//! with its file formats, and the persistent [`Memory`] that caches the
//! discovered extension list.
pub mod provider;
pub mod local;
pub mod config;
pub mod memory;
pub mod error;

/// Re-export key types
pub use provider::StorageProvider;
pub use local::LocalStorageProvider;
pub use config::{ConfigData, ConfigFormat, ConfigRepository, ConfigStore};
pub use memory::{Memory, MemoryProvider};
