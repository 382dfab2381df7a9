/// Application name
pub const APP_NAME: &str = "orchestra";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Manifest file looked up beneath every search root
pub const MANIFEST_FILE_NAME: &str = "orchestra.json";

/// Bootstrap slot probed for every started extension (after its autoload entries)
pub const BOOTSTRAP_FILE_NAME: &str = "orchestra.rs";

/// Configuration namespace owned by the extension component
pub const CONFIG_NAMESPACE: &str = "orchestra/extension";

/// Memory key holding the trimmed projection of every detected extension
pub const AVAILABLE_KEY: &str = "extensions.available";

/// Memory key holding activated extensions
pub const ACTIVE_KEY: &str = "extensions.active";

/// Sentinel name of the host application itself
pub const APP_EXTENSION_NAME: &str = "app";

/// Version constraint used when a manifest declares none
pub const DEFAULT_VERSION_CONSTRAINT: &str = ">0";

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "orchestra.toml";

/// Default memory file, relative to the base path
pub const MEMORY_FILE_NAME: &str = "storage/extensions.json";

/// Platform-internal names no discovered extension may claim
pub const RESERVED_NAMES: &[&str] = &[
    "orchestra",
    "resources",
    "orchestra/asset",
    "orchestra/auth",
    "orchestra/debug",
    "orchestra/extension",
    "orchestra/facile",
    "orchestra/foundation",
    "orchestra/html",
    "orchestra/memory",
    "orchestra/model",
    "orchestra/optimize",
    "orchestra/platform",
    "orchestra/resources",
    "orchestra/support",
    "orchestra/testbench",
    "orchestra/view",
    "orchestra/widget",
];

/// Config key under which an extension's route handle is published
pub fn handles_key(name: &str) -> String {
    format!("{}::handles.{}", CONFIG_NAMESPACE, name)
}

/// Config key holding the operating mode (`normal` or `safe`)
pub fn mode_key() -> String {
    format!("{}::mode", CONFIG_NAMESPACE)
}
