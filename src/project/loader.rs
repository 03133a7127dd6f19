//! Document loading.
//!
//! The resolver never touches the filesystem directly; it goes through a
//! [`SourceLoader`]. [`FsLoader`] reads real files, [`MemoryLoader`] serves
//! documents from memory (editors with unsaved buffers, tests).

use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

use crate::base::constants::NEVA_EXTENSION;

/// Why a document or package could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("document {} is outside the workspace {}", .path.display(), .root.display())]
    OutsideWorkspace { path: PathBuf, root: PathBuf },

    #[error("document {} exists but cannot be read", .0.display())]
    AccessDenied(PathBuf),

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// Map an I/O error on `path` to the matching load error.
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory => {
                LoadError::AccessDenied(path.to_path_buf())
            }
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Source of document text and package listings.
pub trait SourceLoader: Send + Sync {
    /// Read the full text of one document.
    fn read_document(&self, path: &Path) -> Result<String, LoadError>;

    /// The `.neva` documents directly inside `dir`, sorted by path.
    fn package_documents(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError>;

    fn is_dir(&self, path: &Path) -> bool;
}

fn is_neva_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(NEVA_EXTENSION)
}

/// Loads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn read_document(&self, path: &Path) -> Result<String, LoadError> {
        // Directories exist but are never readable as documents.
        if path.is_dir() {
            return Err(LoadError::AccessDenied(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "read document");
        Ok(text)
    }

    fn package_documents(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let entries = std::fs::read_dir(dir).map_err(|e| LoadError::from_io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LoadError::from_io(dir, e))?;
            let path = entry.path();
            if path.is_file() && is_neva_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// In-memory documents keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: IndexMap<PathBuf, String>,
    denied: FxHashSet<PathBuf>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Make a path report `AccessDenied` when read.
    pub fn deny(&mut self, path: impl Into<PathBuf>) {
        self.denied.insert(path.into());
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.files.shift_remove(path)
    }
}

impl SourceLoader for MemoryLoader {
    fn read_document(&self, path: &Path) -> Result<String, LoadError> {
        if self.denied.contains(path) || self.is_dir(path) {
            return Err(LoadError::AccessDenied(path.to_path_buf()));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }

    fn package_documents(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        if !self.is_dir(dir) {
            return Err(LoadError::NotFound(dir.to_path_buf()));
        }
        let mut paths: Vec<_> = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir) && is_neva_file(p))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|p| p != path && p.starts_with(path))
    }
}
