//! Terminal output and logging setup for the `orchestra` binary.
use orchestra_extension::kernel::constants::AVAILABLE_KEY;
use orchestra_extension::{Extensions, Memory, PluginCatalog, RouteGenerator};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

/// Route `log` records through `tracing` and print them to stderr.
///
/// `RUST_LOG` wins over the verbosity flag.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

/// One line per detected extension: name, symbolic path and version constraint
pub fn print_extensions(extensions: &Extensions) {
    if extensions.is_empty() {
        println!("No extensions found.");
        return;
    }
    for descriptor in extensions {
        println!("{:<32} {:<40} {}", descriptor.name, descriptor.path, descriptor.version);
    }
}

/// Detected descriptors keyed by name, pretty-printed
pub fn extensions_json(extensions: &Extensions) -> String {
    let map: Map<String, Value> = extensions
        .iter()
        .filter_map(|descriptor| {
            serde_json::to_value(descriptor.as_ref())
                .ok()
                .map(|value| (descriptor.name.clone(), value))
        })
        .collect();
    serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_else(|_| "{}".to_string())
}

/// Cached extensions with an `[x]` mark for active ones
pub fn print_available(catalog: &PluginCatalog, memory: &dyn Memory) {
    let available = match memory.get(AVAILABLE_KEY) {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => {
            println!("No extensions available. Run `orchestra detect` first.");
            return;
        }
    };

    for (name, entry) in &available {
        let mark = if catalog.activated(name) { "x" } else { " " };
        let path = entry.get("path").and_then(Value::as_str).unwrap_or_default();
        println!("[{}] {:<32} {}", mark, name, path);
    }
}

/// Resolved URLs of a route handle, plus the outcome of a pattern check
pub fn print_route(name: &str, route: &RouteGenerator, pattern: Option<&str>) {
    println!("extension: {}", name);
    println!("prefix:    {}", route.prefix(false));
    if let Some(domain) = route.domain(false) {
        println!("domain:    {}", domain);
    }
    println!("root:      {}", route.root());
    println!("path:      {}", route.path());
    if let Some(pattern) = pattern {
        println!("is({}):    {}", pattern, route.is(pattern));
    }
}
