use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::kernel::error::{Error, Result};
use crate::storage::error::StorageSystemError;
use crate::storage::provider::StorageProvider;

/// Characters that turn a path component into a glob component
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Local filesystem storage provider
#[derive(Clone)]
pub struct LocalStorageProvider {
    base_path: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider with the given base path.
    ///
    /// Relative paths handed to the provider are resolved against the base
    /// path; absolute paths are used as-is.
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve a relative path against the base path
    fn resolve_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.base_path.join(path)
    }

    /// Split a normalized pattern into the literal directory that can be
    /// walked and the number of components below it that carry wildcards.
    fn split_glob_root(pattern: &Path) -> (PathBuf, usize) {
        let mut root = PathBuf::new();
        let mut depth = 0;

        for component in pattern.components() {
            let has_meta = matches!(component, Component::Normal(part) if part.to_string_lossy().contains(GLOB_META));
            if depth > 0 || has_meta {
                depth += 1;
            } else {
                root.push(component);
            }
        }

        (root, depth)
    }
}

impl StorageProvider for LocalStorageProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        // Collecting the components drops doubled and trailing separators
        let normalized: PathBuf = self.resolve_path(pattern).components().collect();
        let (root, depth) = Self::split_glob_root(&normalized);

        if depth == 0 {
            return if normalized.is_file() { vec![normalized] } else { Vec::new() };
        }

        let matcher = match GlobBuilder::new(&normalized.to_string_lossy())
            .literal_separator(true)
            .build()
        {
            Ok(glob) => glob.compile_matcher(),
            Err(e) => {
                log::warn!("Ignoring invalid search pattern '{}': {}", pattern, e);
                return Vec::new();
            }
        };

        WalkDir::new(&root)
            .min_depth(depth)
            .max_depth(depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| matcher.is_match(path))
            .collect()
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve_path(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve_path(path).is_dir()
    }

    fn is_writable(&self, path: &Path) -> bool {
        can_write(&self.resolve_path(path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full_path = self.resolve_path(path);
        fs::create_dir_all(&full_path).map_err(|e| Error::io(e, "create_dir_all", full_path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let full_path = self.resolve_path(path);
        fs::read_to_string(&full_path).map_err(|e| Error::io(e, "read_to_string", full_path))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<()> {
        let full_path = self.resolve_path(path);

        // Ensure parent directory exists
        let parent = match full_path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => {
                return Err(StorageSystemError::OperationFailed {
                    operation: "write_string".to_string(),
                    path: Some(full_path),
                    message: "Cannot write to path without parent directory".to_string(),
                }.into());
            }
        };
        if !parent.is_dir() {
            fs::create_dir_all(&parent).map_err(|e| Error::io(e, "create_dir_all", parent.clone()))?;
        }

        // Write next to the target, then atomically replace it
        let temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| Error::io(e, "create_temp_file", parent.clone()))?;

        temp_file.as_file().write_all(contents.as_bytes())
            .map_err(|e| Error::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;

        temp_file.persist(&full_path)
            .map_err(|e| Error::io(e.error, "persist_temp_file", full_path.clone()))?;

        Ok(())
    }
}

/// Whether the current process may write `path`, judged by the effective
/// user and group rather than the mode bits alone
#[cfg(unix)]
fn can_write(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    match access(path, AccessFlags::W_OK) {
        Ok(()) => true,
        Err(errno) => {
            log::trace!("{} is not writable: {}", path.display(), errno);
            false
        }
    }
}

#[cfg(not(unix))]
fn can_write(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| !metadata.permissions().readonly())
        .unwrap_or(false)
}

impl fmt::Debug for LocalStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorageProvider")
            .field("base_path", &self.base_path)
            .finish()
    }
}
