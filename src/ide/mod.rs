//! Resolve-file request handling: wire types and the resolver service.
//!
//! ## Design Principles
//!
//! 1. **Atomic responses**: a request yields a whole `File` + `Extra`, or an error
//! 2. **Partial results are explicit**: node failures surface as diagnostics
//! 3. **Read-only**: resolving never writes to the workspace

mod resolve_file;
mod service;

pub use resolve_file::{
    Extra, ResolveFileRequest, ResolveFileResponce, ResolveFileResponse, ResolveOutcome,
};
pub use service::ResolverService;
