use std::path::Path;
use std::sync::Arc;

use crate::kernel::constants::{APP_EXTENSION_NAME, MANIFEST_FILE_NAME, RESERVED_NAMES};
use crate::kernel::error::Result;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::{PluginDescriptor, RawManifest};
use crate::plugin_system::path::PathTokenizer;
use crate::plugin_system::registry::Extensions;
use crate::storage::provider::StorageProvider;

/// Ordered, de-duplicated list of glob patterns searched for manifests.
///
/// Each pattern names a directory and ends with a separator; the manifest
/// file name is appended to it when searching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRoots {
    patterns: Vec<String>,
}

impl SearchRoots {
    /// The application directory plus every `vendor/*/*/` and
    /// `workbench/*/*/` package below the base directory
    pub fn defaults(tokenizer: &PathTokenizer) -> Self {
        let app = tokenizer.app_path();
        let base = tokenizer.base_path();
        Self {
            patterns: vec![
                format!("{}/", app),
                format!("{}/vendor/*/*/", base),
                format!("{}/workbench/*/*/", base),
            ],
        }
    }

    /// Append a pattern unless it is already present. Returns whether it was
    /// added.
    pub fn add(&mut self, pattern: impl Into<String>) -> bool {
        let pattern = pattern.into();
        if self.patterns.contains(&pattern) {
            return false;
        }
        self.patterns.push(pattern);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.patterns.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.patterns
    }
}

/// Locates extension manifests and turns them into descriptors
#[derive(Debug)]
pub struct ManifestFinder {
    storage: Arc<dyn StorageProvider>,
    tokenizer: PathTokenizer,
    roots: SearchRoots,
}

impl ManifestFinder {
    /// Create a finder searching the default roots
    pub fn new(storage: Arc<dyn StorageProvider>, tokenizer: PathTokenizer) -> Self {
        let roots = SearchRoots::defaults(&tokenizer);
        Self { storage, tokenizer, roots }
    }

    /// Add a search root pattern (a directory glob ending with `/`)
    pub fn add_path(&mut self, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        if self.roots.add(path.clone()) {
            log::debug!("Added extension search path '{}'", path);
        }
        self
    }

    /// Current search root patterns, in search order
    pub fn paths(&self) -> &[String] {
        self.roots.as_slice()
    }

    pub fn tokenizer(&self) -> &PathTokenizer {
        &self.tokenizer
    }

    /// Scan every search root for manifests.
    ///
    /// Descriptors are returned in search-root order, then in sorted listing
    /// order within a root. A name found twice keeps its first position but
    /// takes the later descriptor. A reserved name or an undecodable manifest
    /// fails the whole scan.
    pub fn detect(&self) -> Result<Extensions> {
        let mut extensions = Extensions::new();
        log::info!("Detecting extensions in {} search path(s)", self.roots.as_slice().len());

        for pattern in self.roots.iter() {
            let manifests = self.storage.glob(&format!("{}{}", pattern, MANIFEST_FILE_NAME));
            log::debug!("Found {} manifest(s) for '{}'", manifests.len(), pattern);

            for manifest in manifests {
                let Some(name) = self.guess_extension_name(&manifest)? else {
                    log::debug!("Skipping manifest {} without vendor/package directory", manifest.display());
                    continue;
                };

                let descriptor = self.load_manifest(&name, &manifest)?;
                log::debug!("Loaded extension '{}' from {}", name, manifest.display());

                if extensions.insert(Arc::new(descriptor)).is_some() {
                    log::debug!("Extension '{}' found again at {}; using the later manifest", name, manifest.display());
                }
            }
        }

        log::info!("Detected {} extension(s)", extensions.len());
        Ok(extensions)
    }

    /// Read, decode and normalize a single manifest
    pub fn load_manifest(&self, name: &str, manifest: &Path) -> Result<PluginDescriptor> {
        let content = self.storage.read_to_string(manifest)?;
        let raw = RawManifest::from_json(&content).map_err(|source| {
            log::error!("Cannot decode manifest {}: {}", manifest.display(), source);
            PluginSystemError::ManifestDecodeViolation {
                path: manifest.to_path_buf(),
                source,
            }
        })?;

        let source_path = self.guess_extension_path(manifest);
        let mut descriptor = PluginDescriptor::from_manifest(name, &source_path, raw);
        descriptor.path = self.tokenizer.tokenize(&descriptor.path).trim_end_matches('/').to_string();
        Ok(descriptor)
    }

    /// Derive the extension name of a manifest: `app` for the application
    /// directory, `vendor/package` from the two directories holding the
    /// manifest otherwise, `None` when there are not enough directories.
    pub fn guess_extension_name(&self, manifest: &Path) -> Result<Option<String>> {
        let directory = manifest
            .parent()
            .map(|dir| dir.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        let name = if directory.trim_end_matches('/') == self.tokenizer.app_path() {
            APP_EXTENSION_NAME.to_string()
        } else {
            match Self::resolve_extension_namespace(manifest) {
                (Some(vendor), Some(package)) => format!("{}/{}", vendor, package),
                _ => return Ok(None),
            }
        };

        if RESERVED_NAMES.contains(&name.as_str()) {
            log::error!("Refusing to register reserved name '{}' found at {}", name, manifest.display());
            return Err(PluginSystemError::ReservedNameViolation { name }.into());
        }

        Ok(Some(name))
    }

    /// The two directory names preceding the manifest file, when the path has
    /// more than two segments left once the file name is dropped
    pub fn resolve_extension_namespace(manifest: &Path) -> (Option<String>, Option<String>) {
        let manifest = manifest.to_string_lossy().replace('\\', "/");
        let mut fragments: Vec<&str> = manifest.split('/').collect();
        fragments.pop();

        if fragments.len() > 2 {
            let package = fragments.pop().map(String::from);
            let vendor = fragments.pop().map(String::from);
            (vendor, package)
        } else {
            (None, None)
        }
    }

    /// Symbolic directory of a manifest file
    pub fn guess_extension_path(&self, manifest: &Path) -> String {
        let directory = manifest
            .parent()
            .map(|dir| format!("{}/", dir.to_string_lossy()))
            .unwrap_or_default();
        self.tokenizer.tokenize(&directory).trim_end_matches('/').to_string()
    }

    /// Expand a symbolic path into an absolute one
    pub fn resolve_extension_path(&self, path: &str) -> String {
        self.tokenizer.resolve(path)
    }
}
