use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kernel::constants::MEMORY_FILE_NAME;
use crate::kernel::error::{Error, Result};
use crate::storage::config::ConfigData;
use crate::storage::error::StorageSystemError;
use crate::storage::local::LocalStorageProvider;

/// Application settings, loadable from a JSON, YAML or TOML file.
///
/// Relative paths are resolved against `base_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Installation root; `vendor/` and `workbench/` live below it
    pub base_path: PathBuf,
    /// Application directory, `<base>/app` by default
    pub app_path: Option<PathBuf>,
    /// Web root assets are published to, `<base>/public` by default
    pub public_path: Option<PathBuf>,
    /// File the extension memory is persisted to
    pub memory_file: Option<PathBuf>,
    /// File the registered service list is persisted to
    pub services_file: Option<PathBuf>,
    /// Extra search root patterns, each a directory glob
    pub paths: Vec<String>,
    /// Operating mode written to `orchestra/extension::mode`
    pub mode: Option<String>,
    /// Route handle overrides keyed by extension name
    pub handles: Map<String, Value>,
    /// Root URL of the application
    pub root_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            app_path: None,
            public_path: None,
            memory_file: None,
            services_file: None,
            paths: Vec::new(),
            mode: None,
            handles: Map::new(),
            root_url: "http://localhost".to_string(),
        }
    }
}

impl Settings {
    /// Settings rooted at `base_path` with every other value at its default
    pub fn with_base(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Load settings from a file, picking the format from its extension.
    ///
    /// A relative `base_path` inside the file is taken relative to the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let provider = LocalStorageProvider::new(PathBuf::new());
        let data = ConfigData::load(&provider, path)?;

        let value = serde_json::to_value(&data).map_err(|e| StorageSystemError::SerializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })?;
        let mut settings: Settings = serde_json::from_value(value).map_err(|e| {
            Error::from(StorageSystemError::DeserializationError {
                format: "settings".to_string(),
                source: Box::new(e),
            })
        })?;

        if settings.base_path.is_relative() {
            settings.base_path = directory.join(&settings.base_path);
        }
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Absolute installation root
    pub fn base(&self) -> Result<PathBuf> {
        let absolute = std::path::absolute(&self.base_path)
            .map_err(|e| Error::io(e, "absolute", self.base_path.clone()))?;
        Ok(absolute.components().collect())
    }

    pub fn app(&self) -> Result<PathBuf> {
        self.resolve(self.app_path.as_deref(), "app")
    }

    pub fn public(&self) -> Result<PathBuf> {
        self.resolve(self.public_path.as_deref(), "public")
    }

    pub fn memory(&self) -> Result<PathBuf> {
        self.resolve(self.memory_file.as_deref(), MEMORY_FILE_NAME)
    }

    pub fn services(&self) -> Result<PathBuf> {
        self.resolve(self.services_file.as_deref(), "storage/services.json")
    }

    /// Extra search roots with relative patterns anchored on the base path
    pub fn search_paths(&self) -> Result<Vec<String>> {
        let base = self.base()?;
        Ok(self
            .paths
            .iter()
            .map(|pattern| {
                let pattern = if Path::new(pattern).is_absolute() {
                    pattern.clone()
                } else {
                    format!("{}/{}", base.to_string_lossy().trim_end_matches('/'), pattern)
                };
                if pattern.ends_with('/') { pattern } else { format!("{}/", pattern) }
            })
            .collect())
    }

    fn resolve(&self, configured: Option<&Path>, default: &str) -> Result<PathBuf> {
        let base = self.base()?;
        Ok(match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => base.join(path).components().collect(),
            None => base.join(default),
        })
    }
}
