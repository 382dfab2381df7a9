//! Symbolic path tokens.
//!
//! Descriptors never store absolute directories: a path below one of the
//! well-known roots is stored as `<token>::<rest>` so the same manifest cache
//! stays valid when the installation moves.
use std::fmt;
use std::path::Path;

/// The well-known roots a symbolic path can be anchored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    App,
    Vendor,
    Workbench,
    Base,
    /// Directory of the extension currently being started
    SourcePath,
}

impl RootKind {
    /// Roots that are fixed for the lifetime of a tokenizer
    pub const STATIC: [RootKind; 4] = [RootKind::App, RootKind::Vendor, RootKind::Workbench, RootKind::Base];

    /// Prefix used in symbolic paths
    pub fn token(&self) -> &'static str {
        match self {
            RootKind::App => "app::",
            RootKind::Vendor => "vendor::",
            RootKind::Workbench => "workbench::",
            RootKind::Base => "base::",
            RootKind::SourcePath => "source-path::",
        }
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token().trim_end_matches("::"))
    }
}

/// Bidirectional mapping between absolute directories and symbolic paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTokenizer {
    app: String,
    base: String,
    source: Option<String>,
}

impl PathTokenizer {
    /// Create a tokenizer for the given application and base directories.
    ///
    /// `vendor` and `workbench` live directly below `base`.
    pub fn new(app_path: impl AsRef<Path>, base_path: impl AsRef<Path>) -> Self {
        Self {
            app: normalize_root(app_path.as_ref()),
            base: normalize_root(base_path.as_ref()),
            source: None,
        }
    }

    /// A copy of this tokenizer that also resolves `source-path::` against
    /// `source`, itself a (possibly symbolic) extension directory.
    pub fn with_source(&self, source: &str) -> Self {
        Self {
            source: Some(source.trim_end_matches('/').to_string()),
            ..self.clone()
        }
    }

    /// Application directory, without trailing separator
    pub fn app_path(&self) -> &str {
        &self.app
    }

    /// Base directory, without trailing separator
    pub fn base_path(&self) -> &str {
        &self.base
    }

    /// Absolute directory (with trailing separator) a static root stands for
    pub fn root(&self, kind: RootKind) -> Option<String> {
        match kind {
            RootKind::App => Some(format!("{}/", self.app)),
            RootKind::Vendor => Some(format!("{}/vendor/", self.base)),
            RootKind::Workbench => Some(format!("{}/workbench/", self.base)),
            RootKind::Base => Some(format!("{}/", self.base)),
            RootKind::SourcePath => None,
        }
    }

    /// Replace the longest matching root prefix of an absolute path with its
    /// token. Paths outside every root are returned unchanged.
    pub fn tokenize(&self, path: &str) -> String {
        let path = path.replace('\\', "/");
        let best = RootKind::STATIC
            .iter()
            .filter_map(|kind| self.root(*kind).map(|root| (*kind, root)))
            .filter(|(_, root)| path.starts_with(root.as_str()))
            .max_by_key(|(_, root)| root.len());

        match best {
            Some((kind, root)) => format!("{}{}", kind.token(), &path[root.len()..]),
            None => path,
        }
    }

    /// [`tokenize`](Self::tokenize) for a filesystem path
    pub fn tokenize_path(&self, path: &Path) -> String {
        self.tokenize(&path.to_string_lossy())
    }

    /// Expand a leading token into its absolute directory. Unknown or absent
    /// tokens pass through unchanged.
    ///
    /// `source-path::` is first replaced with the source directory (when one
    /// was given through [`with_source`](Self::with_source)), which may itself
    /// be symbolic and is expanded in turn.
    pub fn resolve(&self, symbolic: &str) -> String {
        let expanded = match (&self.source, symbolic.strip_prefix(RootKind::SourcePath.token())) {
            (Some(source), Some(rest)) => {
                format!("{}/{}", source, rest).replacen("app::/", "app::", 1)
            }
            _ => symbolic.to_string(),
        };

        for kind in RootKind::STATIC {
            if let (Some(rest), Some(root)) = (expanded.strip_prefix(kind.token()), self.root(kind)) {
                return format!("{}{}", root, rest);
            }
        }
        expanded
    }
}

fn normalize_root(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").trim_end_matches('/').to_string()
}
