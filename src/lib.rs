//! # neva-resolver
//!
//! File resolver for Neva dataflow sources: given a workspace and a document,
//! produce the document's source model (`File`) plus, for every component and
//! every node inside it, the ports the node exposes (`Extra.nodesPorts`).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → ResolverService, resolve-file wire types
//!   ↓
//! hir       → Scope, interface extraction, port index, network check
//!   ↓
//! project   → Document identity, loaders, packages, parse cache
//!   ↓
//! syntax    → Source model (File) and lowering
//!   ↓
//! parser    → Logos lexer, rowan CST, typed AST
//!   ↓
//! base      → Position/Span, LineIndex, constants
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → project → hir → ide)
// ============================================================================

/// Foundation types: Position, Span, LineIndex
pub mod base;

/// Parser: Logos lexer, recursive-descent parser, typed AST
pub mod parser;

/// Syntax: source model and lowering
pub mod syntax;

/// Project: documents, loaders, packages, parse cache
pub mod project;

/// Resolution: scopes, interfaces, port index, diagnostics
pub mod hir;

/// Resolve-file requests and the resolver service
pub mod ide;

pub mod config;
pub mod error;

// Re-export the request surface
pub use config::{NodeErrorPolicy, ResolverConfig};
pub use error::{ErrorKind, ErrorReport, ResolveError};
pub use hir::{Diagnostic, NodesPorts, Severity};
pub use ide::{
    Extra, ResolveFileRequest, ResolveFileResponce, ResolveFileResponse, ResolveOutcome,
    ResolverService,
};
pub use project::{DocumentId, FsLoader, MemoryLoader, SourceLoader, Uri};
pub use syntax::{File, Interface};

// Re-export foundation types
pub use base::{LineIndex, Position, Span, TextRange, TextSize};
