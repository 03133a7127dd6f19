//! Diagnostics: problems found while resolving a file.
//!
//! Errors scoped to a node leave that node out of the port index; errors
//! scoped to an entity leave the entity in place. Nothing here aborts a
//! resolution on its own; the service decides that from its policy.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::Span;
use crate::syntax::{IssueKind, SyntaxIssue};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Error/warning code (e.g., "E0001").
    pub code: SmolStr,
    pub severity: Severity,
    /// Owning entity, usually a component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<SmolStr>,
    /// Node path (`parent/child`) inside `component`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Offending port name, for duplicate ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<SmolStr>,
    /// 0-indexed start/end positions.
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(code: &str, span: Span, message: impl Into<String>) -> Self {
        Self {
            code: SmolStr::new(code),
            severity: Severity::Error,
            component: None,
            node: None,
            port: None,
            span,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: &str, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, span, message)
        }
    }

    /// Scope the diagnostic to an entity.
    pub fn with_component(mut self, component: impl Into<SmolStr>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Scope the diagnostic to a node.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_port(mut self, port: impl Into<SmolStr>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Whether this diagnostic removes a node from the port index.
    pub fn is_node_error(&self) -> bool {
        self.is_error() && self.node.is_some()
    }
}

impl From<&SyntaxIssue> for Diagnostic {
    fn from(issue: &SyntaxIssue) -> Self {
        let code = match issue.kind {
            IssueKind::Syntax => codes::SYNTAX_ERROR,
            IssueKind::DuplicatePort => codes::DUPLICATE_PORT,
            IssueKind::DuplicateNode => codes::DUPLICATE_NODE,
            IssueKind::DuplicateEntity => codes::DUPLICATE_ENTITY,
        };
        Self {
            component: issue.entity.clone(),
            node: issue.node.clone(),
            port: issue.port.clone(),
            ..Self::error(code, issue.span, issue.message.clone())
        }
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Error Code Ranges
///
/// - **E0001-E0099**: Resolution errors (syntax, duplicates, references)
/// - **W0001-W0099**: Warnings (network consistency)
pub mod codes {
    /// Syntax error inside a declaration.
    pub const SYNTAX_ERROR: &str = "E0001";
    /// Port declared twice in one direction of an interface.
    pub const DUPLICATE_PORT: &str = "E0002";
    /// Node declared twice in one component.
    pub const DUPLICATE_NODE: &str = "E0003";
    /// Entity or import alias declared twice in one file.
    pub const DUPLICATE_ENTITY: &str = "E0004";
    /// Node refers to an entity that cannot be found.
    pub const UNRESOLVED_ENTITY: &str = "E0005";
    /// Node refers to a type or constant.
    pub const NOT_AN_INTERFACE: &str = "E0006";
    /// Node supplies the wrong number of type arguments.
    pub const TYPE_ARGS_MISMATCH: &str = "E0007";
    /// Qualified reference through an alias that is not imported.
    pub const UNKNOWN_IMPORT: &str = "E0008";
    /// Qualified reference to a non-public entity.
    pub const PRIVATE_ENTITY: &str = "E0009";

    /// Connection names a node or port that does not exist.
    pub const UNKNOWN_NETWORK_REF: &str = "W0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during one resolution.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add the problems recorded while lowering.
    pub fn extend_issues<'a>(&mut self, issues: impl IntoIterator<Item = &'a SyntaxIssue>) {
        self.diagnostics
            .extend(issues.into_iter().map(Diagnostic::from));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Finish collection, sorted by position (stable for equal positions).
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| (d.span.start, d.span.end));
        self.diagnostics
    }
}
