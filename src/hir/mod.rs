//! Resolution layer: from a lowered file to its node port index.
//!
//! ## Stages
//!
//! ```text
//! LoweredFile                ← syntax::lower (per file, cached)
//!     │
//!     ▼
//! Scope::resolve(ref)        ← file → package siblings → builtin, or import alias
//!     │
//!     ▼
//! extract(scope, file)       ← interface of every node, node-scoped failures
//!     │
//!     ▼
//! build_index(file, nodes)   ← component → node path → interface
//!     │
//!     ▼
//! check_network(file, nodes) ← warnings for unknown connection endpoints
//! ```

mod diagnostics;
mod extract;
mod network;
mod ports;
mod scope;

pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use extract::{Extraction, NodeInterface, extract, instantiate};
pub use network::check_network;
pub use ports::{IntegrityError, NodesPorts, build_index, check_integrity, find_node};
pub use scope::{ResolvedEntity, Scope, ScopeError};
