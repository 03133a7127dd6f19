//! Document identity and workspace containment checks.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::LoadError;

/// A document location as sent by the client.
///
/// `fs_path` is authoritative for I/O; `path` is the client's addressing
/// form and is only echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Uri {
    pub path: String,
    pub fs_path: String,
}

impl Uri {
    /// Build a URI whose `path` and `fsPath` are the same filesystem path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let text = path.as_ref().to_string_lossy().into_owned();
        Self {
            path: text.clone(),
            fs_path: text,
        }
    }

    pub fn fs_path(&self) -> PathBuf {
        PathBuf::from(&self.fs_path)
    }
}

/// The document half of a resolve request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentId {
    pub uri: Uri,
    pub file_name: String,
}

impl DocumentId {
    pub fn new(uri: Uri, file_name: impl Into<String>) -> Self {
        Self {
            uri,
            file_name: file_name.into(),
        }
    }

    /// Name shown in diagnostics: `fileName`, or the last segment of `fsPath`.
    pub fn display_name(&self) -> String {
        if !self.file_name.is_empty() {
            return self.file_name.clone();
        }
        Path::new(&self.uri.fs_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.uri.fs_path.clone())
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root; leading `..` of relative paths are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve the document path and check it lies inside the workspace root.
///
/// Both paths are normalized lexically; containment is a component-wise
/// prefix test, so `/ws-other/a.neva` is not inside `/ws`.
pub fn document_path(workspace: &Uri, document: &DocumentId) -> Result<PathBuf, LoadError> {
    if document.uri.fs_path.is_empty() {
        return Err(LoadError::NotFound(PathBuf::new()));
    }
    let root = normalize(&workspace.fs_path());
    let path = normalize(&document.uri.fs_path());
    if root.as_os_str().is_empty() || !path.starts_with(&root) || path == root {
        return Err(LoadError::OutsideWorkspace { path, root });
    }
    Ok(path)
}
