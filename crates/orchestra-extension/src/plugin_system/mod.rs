//! # Orchestra Extension Plugin System
//!
//! Discovery and lifecycle of extensions: packages that ship an
//! `orchestra.json` manifest below the application directory, a
//! `vendor/<vendor>/<package>` directory or a `workbench/<vendor>/<package>`
//! directory.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`path`]**: Maps absolute directories to symbolic `app::`, `vendor::`,
//!   `workbench::`, `base::` and `source-path::` paths and back.
//! - **[`manifest`]**: The decoded manifest ([`RawManifest`]), default merging
//!   and the normalized [`PluginDescriptor`].
//! - **[`finder`]**: The [`ManifestFinder`] walking the search roots.
//! - **[`registry`]**: [`Extensions`], the ordered name to descriptor collection.
//! - **[`bootstrap`]**: Callbacks run when an extension starts.
//! - **[`provider`]**: The [`ServiceRegistrar`] receiving declared services.
//! - **[`dispatcher`]**: The [`LifecycleDispatcher`] driving register, start,
//!   boot and finish.
//! - **[`status`]**: Safe mode detection.
//! - **[`catalog`]**: The [`PluginCatalog`] tying everything together.
//! - **[`route`]**: The [`RouteGenerator`] resolving route handles.
//! - **[`error`]**: [`PluginSystemError`](error::PluginSystemError).
pub mod path;
pub mod manifest;
pub mod finder;
pub mod registry;
pub mod bootstrap;
pub mod provider;
pub mod dispatcher;
pub mod status;
pub mod catalog;
pub mod route;
pub mod error;

pub use path::{PathTokenizer, RootKind};
pub use manifest::{DescriptorBuilder, ManifestFields, PluginDescriptor, RawManifest, merge_defaults};
pub use finder::{ManifestFinder, SearchRoots};
pub use registry::Extensions;
pub use bootstrap::{Bootstrap, BootstrapContext, BootstrapRegistry};
pub use provider::{ProviderRepository, ServiceRegistrar};
pub use dispatcher::LifecycleDispatcher;
pub use status::StatusChecker;
pub use catalog::{Collaborators, PluginCatalog, Publisher};
pub use route::{RequestFacts, RouteGenerator, RouteGroup};

// Test module declaration
#[cfg(test)]
mod tests;
