//! # Orchestra Extension Plugin System Errors
//!
//! [`PluginSystemError`] covers the failures of discovery and lifecycle
//! dispatch. Discovery failures (reserved names, undecodable manifests) abort
//! the whole detection pass; bootstrap failures propagate out of the
//! registration call that triggered them.
use std::path::PathBuf;

use crate::kernel::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Unable to register reserved name [{name}] as extension.")]
    ReservedNameViolation { name: String },

    #[error("Cannot decode file [{}]: {source}", path.display())]
    ManifestDecodeViolation {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Bootstrap '{}' of extension '{plugin_id}' failed: {source}", path.display())]
    BootstrapExecutionFailure {
        plugin_id: String,
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Extension '{name}' is not available")]
    UnknownExtension { name: String },
}
