//! Route prefixes.
//!
//! An extension declares where its routes are mounted with a handle string:
//! either a plain prefix (`acme`, `admin/blog`) or a domain form
//! (`//blog.example.com/hello`, `https://blog.{{domain}}`). [`RouteGenerator`]
//! turns that string plus the facts of the current request into URLs and path
//! checks.
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the current request host in domain handles
pub const DOMAIN_WILDCARD: &str = "{{domain}}";

/// What the route generator needs to know about the current request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFacts {
    /// Root URL of the application (`http://localhost/laravel`)
    #[serde(default)]
    pub root: String,
    /// Request path relative to the root
    #[serde(default)]
    pub path: String,
    /// The `_mode` request input
    #[serde(default)]
    pub mode: Option<String>,
}

impl RequestFacts {
    pub fn new(root: &str, path: &str) -> Self {
        Self {
            root: root.to_string(),
            path: path.to_string(),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }
}

/// Arguments for mounting a route group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteGroup {
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Resolves an extension's route handle against the current request
#[derive(Debug, Clone)]
pub struct RouteGenerator {
    domain: Option<String>,
    prefix: String,
    request: RequestFacts,
    base_url: String,
    base_prefix: String,
    scheme: &'static str,
}

impl RouteGenerator {
    /// Parse a handle string for the given request
    pub fn new(handles: &str, request: RequestFacts) -> Self {
        let scheme = if request.root.starts_with("https") { "https://" } else { "http://" };
        let base_url = strip_scheme(&request.root).to_string();
        let (host, base_prefix) = match base_url.split_once('/') {
            Some((host, rest)) => (host.to_string(), trim_slashes(rest)),
            None => (base_url.clone(), String::new()),
        };

        let (domain, prefix) = match domain_form(handles) {
            Some(rest) => {
                let (domain, prefix) = rest.split_once('/').unwrap_or((rest, ""));
                (Some(domain.replace(DOMAIN_WILDCARD, &host)), prefix.to_string())
            }
            None => (None, handles.to_string()),
        };

        Self {
            domain,
            prefix,
            request,
            base_url,
            base_prefix,
            scheme,
        }
    }

    /// The handle's domain. With `forced`, the request host stands in when
    /// the handle has none.
    pub fn domain(&self, forced: bool) -> Option<String> {
        match (&self.domain, forced) {
            (Some(domain), _) => Some(domain.clone()),
            (None, true) => Some(self.host().to_string()),
            (None, false) => None,
        }
    }

    /// The handle's path prefix, `/` when empty. With `forced` and no domain,
    /// the root URL's own path is prepended.
    pub fn prefix(&self, forced: bool) -> String {
        let prefix = trim_or_root(&self.prefix);
        if forced && self.domain.is_none() && !self.base_prefix.is_empty() {
            return trim_or_root(&format!("{}/{}", self.base_prefix, prefix));
        }
        prefix
    }

    /// Absolute URL the handle is mounted on
    pub fn root(&self) -> String {
        let domain = self.domain(true).unwrap_or_default();
        let prefix = self.prefix(true);
        format!("{}{}/{}", self.scheme, domain, prefix)
            .trim_matches('/')
            .to_string()
    }

    /// Absolute URL of a path below the handle; query strings are kept
    pub fn to(&self, path: &str) -> String {
        format!("{}/{}", self.root(), path.trim_matches('/'))
            .trim_matches('/')
            .to_string()
    }

    /// The current request path, `/` when empty
    pub fn path(&self) -> String {
        trim_or_root(&self.request.path)
    }

    /// The current request path below the handle's prefix
    pub fn relative_path(&self) -> String {
        let path = self.path();
        let prefix = self.prefix(false);
        if prefix == "/" {
            return path;
        }
        match path.strip_prefix(prefix.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => trim_or_root(rest),
            _ => path,
        }
    }

    /// Route group arguments: the prefix, plus the domain when the handle has
    /// one
    pub fn group(&self) -> RouteGroup {
        RouteGroup {
            prefix: self.prefix(false),
            domain: self.domain(false),
        }
    }

    /// Whether the current request path matches `pattern` below the handle's
    /// prefix. `*` matches any run of characters, slashes included; the bare
    /// `*` pattern also matches the prefix itself.
    pub fn is(&self, pattern: &str) -> bool {
        let prefix = self.prefix(false);
        let full = if pattern == "*" {
            format!("{}*", prefix)
        } else {
            format!("{}/{}", prefix, pattern)
        };
        wildcard_match(&trim_or_root(&full), &self.path())
    }

    /// Host of the current request
    pub fn host(&self) -> &str {
        self.base_url.split('/').next().unwrap_or_default()
    }

    pub fn request(&self) -> &RequestFacts {
        &self.request
    }
}

impl fmt::Display for RouteGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix(false))
    }
}

/// Remainder of a domain handle after its scheme (`//`, `http://` or
/// `https://`)
fn domain_form(handles: &str) -> Option<&str> {
    ["//", "http://", "https://"]
        .iter()
        .find_map(|scheme| handles.strip_prefix(scheme))
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}

fn trim_slashes(value: &str) -> String {
    value.trim_matches('/').to_string()
}

fn trim_or_root(value: &str) -> String {
    let trimmed = value.trim_matches('/');
    if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() }
}

/// Anchored, case-sensitive match where `*` stands for any characters
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == value {
        return true;
    }
    let expression = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    match Regex::new(&expression) {
        Ok(regex) => regex.is_match(value),
        Err(e) => {
            log::warn!("Ignoring invalid route pattern '{}': {}", pattern, e);
            false
        }
    }
}
