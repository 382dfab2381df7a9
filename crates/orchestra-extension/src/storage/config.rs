use std::fmt::Debug;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kernel::error::{Error, Result};
use crate::storage::error::StorageSystemError;
use crate::storage::StorageProvider;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// In-memory tree of configuration values addressed by dotted keys.
///
/// `a.b.c` walks nested objects; a segment may itself contain `/` or `::`
/// (`orchestra/extension::handles.acme/blog` has two segments).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl ConfigData {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// Create a configuration from a JSON object
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Borrow the value stored under a dotted key
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Get a configuration value, deserialized into `T`
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.get_value(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a configuration value with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Store a raw value under a dotted key, creating intermediate objects.
    ///
    /// An intermediate segment holding a non-object value is replaced.
    pub fn set_value(&mut self, key: &str, value: Value) {
        let mut segments: Vec<&str> = key.split('.').collect();
        let last = segments.pop().unwrap_or_default();

        let mut current = &mut self.values;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), value);
    }

    /// Set a configuration value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| StorageSystemError::SerializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })?;
        self.set_value(key, json_value);
        Ok(())
    }

    /// Remove a configuration value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let (parent, last) = match key.rsplit_once('.') {
            Some((parent, last)) => (Some(parent), last),
            None => (None, key),
        };
        let container = match parent {
            Some(parent) => self.get_value_mut(parent)?.as_object_mut()?,
            None => &mut self.values,
        };
        container.shift_remove(last)
    }

    fn get_value_mut(&mut self, key: &str) -> Option<&mut Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.values.get_mut(first)?;
        for segment in segments {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        Some(current)
    }

    /// Check if key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Get all top-level keys
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Merge with another config, overriding existing top-level values
    pub fn merge(&mut self, other: &ConfigData) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String> {
        let serialized: std::result::Result<String, BoxedSource> = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(&self)
                .map_err(|e| Box::new(e) as BoxedSource),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(&self)
                .map_err(|e| Box::new(e) as BoxedSource),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(&self)
                .map_err(|e| Box::new(e) as BoxedSource),
        };
        serialized.map_err(|source| {
            Error::from(StorageSystemError::SerializationError {
                format: format.extension().to_string(),
                source,
            })
        })
    }

    /// Deserialize from string based on format
    pub fn deserialize(data: &str, format: ConfigFormat) -> Result<Self> {
        let deserialized: std::result::Result<Self, BoxedSource> = match format {
            ConfigFormat::Json => serde_json::from_str(data)
                .map_err(|e| Box::new(e) as BoxedSource),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data)
                .map_err(|e| Box::new(e) as BoxedSource),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data)
                .map_err(|e| Box::new(e) as BoxedSource),
        };
        deserialized.map_err(|source| {
            Error::from(StorageSystemError::DeserializationError {
                format: format.extension().to_string(),
                source,
            })
        })
    }

    /// Load a configuration file through a storage provider, picking the
    /// format from the file extension.
    pub fn load<P: StorageProvider + ?Sized>(provider: &P, path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.display().to_string()))?;
        if !provider.is_file(path) {
            return Err(StorageSystemError::FileNotFound(path.to_path_buf()).into());
        }
        let content = provider.read_to_string(path)?;
        Self::deserialize(&content, format)
    }
}

/// Runtime configuration store shared between the catalog, the dispatcher and
/// bootstraps.
pub trait ConfigStore: Send + Sync + Debug {
    /// Read the value stored under a dotted key
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value under a dotted key
    fn set(&self, key: &str, value: Value);

    /// Read a value, falling back to `default` when the key is absent
    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Read a string value; non-string values are treated as absent
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|value| value.as_str().map(String::from))
    }
}

/// Default [`ConfigStore`] backed by a [`ConfigData`] tree
#[derive(Debug, Default)]
pub struct ConfigRepository {
    data: RwLock<ConfigData>,
}

impl ConfigRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with existing values
    pub fn from_data(data: ConfigData) -> Self {
        Self { data: RwLock::new(data) }
    }

    /// Snapshot of the current values
    pub fn snapshot(&self) -> ConfigData {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ConfigStore for ConfigRepository {
    fn get(&self, key: &str) -> Option<Value> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get_value(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.set_value(key, value);
    }
}
