//! Wire types of the resolve-file request.

use serde::{Deserialize, Serialize};

use crate::hir::{Diagnostic, NodesPorts};
use crate::project::{DocumentId, Uri};
use crate::syntax::File;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveFileRequest {
    pub workspace_uri: Uri,
    pub document: DocumentId,
}

impl ResolveFileRequest {
    pub fn new(workspace_uri: Uri, document: DocumentId) -> Self {
        Self {
            workspace_uri,
            document,
        }
    }
}

/// Rendering metadata returned next to the source model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extra {
    /// component → node path → port set.
    pub nodes_ports: NodesPorts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveFileResponse {
    pub file: File,
    pub extra: Extra,
}

/// Contract name of [`ResolveFileResponse`].
pub type ResolveFileResponce = ResolveFileResponse;

/// A response plus everything noticed while producing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveOutcome {
    pub response: ResolveFileResponse,
    /// Sorted by position.
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolveOutcome {
    /// Whether some part of the file could not be resolved.
    pub fn is_partial(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn into_response(self) -> ResolveFileResponse {
        self.response
    }
}
