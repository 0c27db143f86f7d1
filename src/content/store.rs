//! Content store implementations.
//!
//! Keys are relative paths such as `index.html` or `css/site.css`. A key
//! must never name anything outside the store, so every key goes through
//! [`check_key`] before it touches the filesystem.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("path escapes content root: {0}")]
    Traversal(String),
    #[error("failed to read {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Key → bytes lookup backing the resolver.
pub trait ContentStore: Debug + Send + Sync {
    fn exists(&self, key: &str) -> bool;

    fn read(&self, key: &str) -> Result<Vec<u8>, ContentError>;
}

/// Rejects keys that could leave the store: parent components, absolute
/// paths, drive prefixes and embedded NULs.
pub fn check_key(key: &str) -> Result<(), ContentError> {
    if key.contains('\0') {
        return Err(ContentError::Traversal(key.to_string()));
    }

    for component in Path::new(key).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ContentError::Traversal(key.to_string()));
            }
        }
    }

    Ok(())
}

/// Serves files from beneath a single directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens `root`, which must be an existing directory.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }

        Ok(Self { root })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path for `key`, guaranteed to lie under the root.
    ///
    /// Symlinks are followed before the containment check, so a link that
    /// points out of the root is refused as well.
    fn locate(&self, key: &str) -> Result<PathBuf, ContentError> {
        check_key(key)?;

        let resolved = std::fs::canonicalize(self.root.join(key)).map_err(|source| {
            match source.kind() {
                io::ErrorKind::NotFound => ContentError::NotFound(key.to_string()),
                _ => ContentError::Io {
                    key: key.to_string(),
                    source,
                },
            }
        })?;

        if !resolved.starts_with(&self.root) {
            return Err(ContentError::Traversal(key.to_string()));
        }

        Ok(resolved)
    }
}

impl ContentStore for DirectoryStore {
    fn exists(&self, key: &str) -> bool {
        self.locate(key).is_ok_and(|path| path.is_file())
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, ContentError> {
        let path = self.locate(key)?;
        if !path.is_file() {
            return Err(ContentError::NotFound(key.to_string()));
        }

        std::fs::read(&path).map_err(|source| ContentError::Io {
            key: key.to_string(),
            source,
        })
    }
}

/// In-memory store, for fixed content and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), body.into());
    }

    pub fn with(mut self, key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(key, body);
        self
    }
}

impl ContentStore for MemoryStore {
    fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, ContentError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(key.to_string()))
    }
}
