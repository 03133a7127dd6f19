//! Temporary workspaces and request builders.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use neva::{
    DocumentId, MemoryLoader, ResolveFileRequest, ResolverConfig, ResolverService, Uri,
};
use tempfile::TempDir;

/// A workspace on disk, removed when dropped.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `text` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn request(&self, relative: &str) -> ResolveFileRequest {
        request_for(self.root(), &self.root().join(relative))
    }
}

pub fn request_for(root: &Path, document: &Path) -> ResolveFileRequest {
    let file_name = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ResolveFileRequest::new(
        Uri::from_path(root),
        DocumentId::new(Uri::from_path(document), file_name),
    )
}

/// Service over the local filesystem.
pub fn fs_service(config: ResolverConfig) -> ResolverService {
    ResolverService::with_fs(config)
}

/// Service over a single in-memory document at `/ws/main.neva`.
pub fn memory_service(text: &str, config: ResolverConfig) -> (ResolverService, ResolveFileRequest) {
    let loader = MemoryLoader::new().with_file("/ws/main.neva", text);
    let service = ResolverService::new(config, Arc::new(loader));
    (service, request_for(Path::new("/ws"), Path::new("/ws/main.neva")))
}
