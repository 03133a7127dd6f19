//! Workspace access: document identity, loading, packages and the parse cache.

mod cache;
mod document;
mod loader;
mod workspace;

pub use cache::{ParseCache, content_hash};
pub use document::{DocumentId, Uri, document_path, normalize};
pub use loader::{FsLoader, LoadError, MemoryLoader, SourceLoader};
pub use workspace::{FileError, Package, PackageFile, Workspace};
