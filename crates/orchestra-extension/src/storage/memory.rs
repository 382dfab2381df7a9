//! Persistent key-value "memory" used to cache the discovered extension list
//! between processes.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::kernel::error::Result;
use crate::storage::config::{ConfigData, ConfigFormat};
use crate::storage::provider::StorageProvider;

/// Key-value store addressed with dotted keys
pub trait Memory: Send + Sync + Debug {
    /// Read the value stored under a dotted key
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value under a dotted key
    fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Remove the value stored under a dotted key
    fn forget(&self, key: &str) -> Result<()>;

    /// Read a value, falling back to `default` when the key is absent
    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}

/// File the memory is written through to
#[derive(Debug)]
struct Backing {
    provider: Arc<dyn StorageProvider>,
    path: PathBuf,
    format: ConfigFormat,
}

/// Default [`Memory`]: an in-process tree, optionally persisted to a file on
/// every write.
#[derive(Debug)]
pub struct MemoryProvider {
    data: RwLock<ConfigData>,
    backing: Option<Backing>,
}

impl MemoryProvider {
    /// Memory that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(ConfigData::new()),
            backing: None,
        }
    }

    /// Open (or lazily create) a file-backed memory.
    ///
    /// The format follows the file extension and defaults to JSON.
    pub fn open(provider: Arc<dyn StorageProvider>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = ConfigFormat::from_path(&path).unwrap_or(ConfigFormat::Json);

        let data = if provider.is_file(&path) {
            let content = provider.read_to_string(&path)?;
            ConfigData::deserialize(&content, format)?
        } else {
            log::debug!("Memory file {} does not exist yet; starting empty", path.display());
            ConfigData::new()
        };

        Ok(Self {
            data: RwLock::new(data),
            backing: Some(Backing { provider, path, format }),
        })
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.backing.as_ref().map(|backing| backing.path.as_path())
    }

    fn persist(&self, data: &ConfigData) -> Result<()> {
        if let Some(backing) = &self.backing {
            let content = data.serialize(backing.format)?;
            backing.provider.write_string(&backing.path, &content)?;
            log::debug!("Persisted memory to {}", backing.path.display());
        }
        Ok(())
    }
}

impl Memory for MemoryProvider {
    fn get(&self, key: &str) -> Option<Value> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get_value(key).cloned()
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.set_value(key, value);
        self.persist(&data)
    }

    fn forget(&self, key: &str) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        if data.remove(key).is_some() {
            self.persist(&data)?;
        }
        Ok(())
    }
}
