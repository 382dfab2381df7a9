use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::kernel::constants::DEFAULT_VERSION_CONSTRAINT;

/// Manifest file exactly as written by the extension author.
///
/// Every field is optional; an explicit `null` is treated like an absent key.
/// Keys not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawManifest {
    /// Declared name; discovery derives the name from the directory instead
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Overrides the directory the extension is considered to live in
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "map_or_empty_array")]
    pub config: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "list_or_empty_object")]
    pub autoload: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_empty_object")]
    pub provide: Option<Vec<String>>,
}

/// `config` written as `[]` decodes to an empty map
fn map_or_empty_array<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Array(items)) if items.is_empty() => Ok(Some(Map::new())),
        Some(other) => Err(D::Error::custom(format!(
            "invalid type: {}, expected a map",
            json_kind(&other)
        ))),
    }
}

/// `autoload`/`provide` written as `{}` decode to an empty list
fn list_or_empty_object<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(Some(Vec::new())),
        Some(value @ Value::Array(_)) => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!(
            "invalid type: {}, expected a sequence",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

impl RawManifest {
    /// Decode a manifest from JSON text
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Manifest fields with every default applied
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestFields {
    pub description: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub version: String,
    pub config: Map<String, Value>,
    pub autoload: Vec<String>,
    pub provide: Vec<String>,
    pub path: Option<String>,
}

/// Apply the manifest defaults: no description/author/url, version `>0`,
/// empty config, autoload and provide lists.
pub fn merge_defaults(raw: RawManifest) -> ManifestFields {
    ManifestFields {
        description: raw.description,
        author: raw.author,
        url: raw.url,
        version: raw.version.unwrap_or_else(|| DEFAULT_VERSION_CONSTRAINT.to_string()),
        config: raw.config.unwrap_or_default(),
        autoload: raw.autoload.unwrap_or_default(),
        provide: raw.provide.unwrap_or_default(),
        path: raw.path,
    }
}

/// Normalized description of a discovered extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// `app` or `vendor/package`
    pub name: String,

    /// Symbolic directory the extension is considered to live in
    pub path: String,

    /// Symbolic directory the manifest was found in
    #[serde(rename = "source-path")]
    pub source_path: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    /// Version constraint
    #[serde(default = "default_version")]
    pub version: String,

    /// Extension configuration; `handles` holds the route prefix
    #[serde(default)]
    pub config: Map<String, Value>,

    /// Bootstrap entries, started in order
    #[serde(default)]
    pub autoload: Vec<String>,

    /// Service providers to register
    #[serde(default)]
    pub provide: Vec<String>,
}

fn default_version() -> String {
    DEFAULT_VERSION_CONSTRAINT.to_string()
}

impl PluginDescriptor {
    /// Create a descriptor with every optional field at its default
    pub fn new(name: &str, path: &str) -> Self {
        let path = path.trim_end_matches('/').to_string();
        Self {
            name: name.to_string(),
            source_path: path.clone(),
            path,
            description: None,
            author: None,
            url: None,
            version: default_version(),
            config: Map::new(),
            autoload: Vec::new(),
            provide: Vec::new(),
        }
    }

    /// Build a descriptor from a decoded manifest.
    ///
    /// `source_path` is the symbolic directory of the manifest file; the
    /// manifest's `path` key, when present, replaces `path` only.
    pub fn from_manifest(name: &str, source_path: &str, raw: RawManifest) -> Self {
        let fields = merge_defaults(raw);
        let source_path = source_path.trim_end_matches('/').to_string();
        let path = fields
            .path
            .map(|path| path.trim_end_matches('/').to_string())
            .unwrap_or_else(|| source_path.clone());

        Self {
            name: name.to_string(),
            path,
            source_path,
            description: fields.description,
            author: fields.author,
            url: fields.url,
            version: fields.version,
            config: fields.config,
            autoload: fields.autoload,
            provide: fields.provide,
        }
    }

    /// Route prefix declared under `config.handles`
    pub fn handles(&self) -> Option<&Value> {
        self.config.get("handles")
    }

    /// Read a dotted option (`config.handles`, `autoload`, `source-path`)
    pub fn option(&self, key: &str) -> Option<Value> {
        let value = serde_json::to_value(self).ok()?;
        key.split('.')
            .try_fold(&value, |current, segment| current.as_object()?.get(segment))
            .cloned()
    }

    /// Projection cached under `extensions.available`: the descriptor without
    /// its description, author, url and version.
    pub fn cached_projection(&self) -> Value {
        let mut projection = Map::new();
        projection.insert("name".to_string(), Value::String(self.name.clone()));
        projection.insert("path".to_string(), Value::String(self.path.clone()));
        projection.insert("source-path".to_string(), Value::String(self.source_path.clone()));
        projection.insert("config".to_string(), Value::Object(self.config.clone()));
        projection.insert("autoload".to_string(), string_list(&self.autoload));
        projection.insert("provide".to_string(), string_list(&self.provide));
        Value::Object(projection)
    }

    /// Rebuild a descriptor from a cached projection (or any serialized form)
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Builder for creating a plugin descriptor
pub struct DescriptorBuilder {
    descriptor: PluginDescriptor,
}

impl DescriptorBuilder {
    /// Create a new descriptor builder
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            descriptor: PluginDescriptor::new(name, path),
        }
    }

    /// Set the source path (defaults to `path`)
    pub fn source_path(mut self, source_path: &str) -> Self {
        self.descriptor.source_path = source_path.trim_end_matches('/').to_string();
        self
    }

    /// Set the description
    pub fn description(mut self, description: &str) -> Self {
        self.descriptor.description = Some(description.to_string());
        self
    }

    /// Set the author
    pub fn author(mut self, author: &str) -> Self {
        self.descriptor.author = Some(author.to_string());
        self
    }

    /// Set the version constraint
    pub fn version(mut self, version: &str) -> Self {
        self.descriptor.version = version.to_string();
        self
    }

    /// Set the route prefix (`config.handles`)
    pub fn handles(mut self, handles: &str) -> Self {
        self.descriptor
            .config
            .insert("handles".to_string(), Value::String(handles.to_string()));
        self
    }

    /// Set a config entry
    pub fn config(mut self, key: &str, value: Value) -> Self {
        self.descriptor.config.insert(key.to_string(), value);
        self
    }

    /// Append an autoload entry
    pub fn autoload(mut self, entry: &str) -> Self {
        self.descriptor.autoload.push(entry.to_string());
        self
    }

    /// Append a provided service
    pub fn provide(mut self, service: &str) -> Self {
        self.descriptor.provide.push(service.to_string());
        self
    }

    /// Build the descriptor
    pub fn build(self) -> PluginDescriptor {
        self.descriptor
    }
}
