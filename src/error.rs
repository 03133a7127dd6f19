//! Error types for file resolution.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

use crate::base::Position;
use crate::hir::{Diagnostic, codes};
use crate::project::LoadError;
use crate::syntax::FatalSyntax;

/// Errors that fail a whole resolve-file request.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The document or workspace does not exist, or the document is not
    /// inside the workspace.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document exists but cannot be read.
    #[error("access denied: {}", .0.display())]
    AccessDenied(PathBuf),

    /// No declaration boundary could be established.
    #[error("parse error at {position}: {detail}")]
    Parse { position: Position, detail: String },

    /// An entity used by a node declares a port twice.
    #[error("node '{node}': port '{name}' declared more than once (at {position})")]
    DuplicatePort {
        node: String,
        name: SmolStr,
        position: Position,
    },

    /// Any other node-local error, under the `fail` policy.
    #[error("{code} at {position}: {detail}")]
    NodeError {
        code: SmolStr,
        node: Option<String>,
        position: Position,
        detail: String,
    },

    /// The configured deadline passed before the resolution finished.
    #[error("resolution timed out")]
    Timeout,

    /// The caller's cancellation token fired.
    #[error("resolution cancelled")]
    Cancelled,

    /// IO error during read.
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The kind of a [`ResolveError`], as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    AccessDenied,
    Parse,
    DuplicatePort,
    NodeError,
    Timeout,
    Cancelled,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Serializable form of a [`ResolveError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub message: String,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::NotFound(_) => ErrorKind::NotFound,
            ResolveError::AccessDenied(_) => ErrorKind::AccessDenied,
            ResolveError::Parse { .. } => ErrorKind::Parse,
            ResolveError::DuplicatePort { .. } => ErrorKind::DuplicatePort,
            ResolveError::NodeError { .. } => ErrorKind::NodeError,
            ResolveError::Timeout => ErrorKind::Timeout,
            ResolveError::Cancelled => ErrorKind::Cancelled,
            ResolveError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Source position the error points at, when it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            ResolveError::Parse { position, .. }
            | ResolveError::DuplicatePort { position, .. }
            | ResolveError::NodeError { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            position: self.position(),
            message: self.to_string(),
        }
    }

    /// Turn an error diagnostic into a request failure.
    pub fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        let position = diagnostic.span.start;
        if diagnostic.code == codes::SYNTAX_ERROR && diagnostic.node.is_none() {
            return ResolveError::Parse {
                position,
                detail: diagnostic.message.clone(),
            };
        }
        match &diagnostic.port {
            // Reported on the declaring entity itself when no node is involved.
            Some(name) if diagnostic.code == codes::DUPLICATE_PORT => ResolveError::DuplicatePort {
                node: diagnostic
                    .node
                    .clone()
                    .or_else(|| diagnostic.component.as_ref().map(|c| c.to_string()))
                    .unwrap_or_default(),
                name: name.clone(),
                position,
            },
            _ => ResolveError::NodeError {
                code: diagnostic.code.clone(),
                node: diagnostic.node.clone(),
                position,
                detail: diagnostic.message.clone(),
            },
        }
    }
}

impl From<LoadError> for ResolveError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::NotFound(path) | LoadError::OutsideWorkspace { path, .. } => {
                ResolveError::NotFound(path)
            }
            LoadError::AccessDenied(path) => ResolveError::AccessDenied(path),
            LoadError::Io { path, source } => ResolveError::Io { path, source },
        }
    }
}

impl From<FatalSyntax> for ResolveError {
    fn from(fatal: FatalSyntax) -> Self {
        ResolveError::Parse {
            position: fatal.position,
            detail: fatal.detail,
        }
    }
}
