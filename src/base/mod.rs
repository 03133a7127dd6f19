//! Foundation types for the Neva resolver.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineIndex`] - Offset to line/column conversion
//! - [`Position`], [`Span`] - Line/column positions for declarations
//! - Domain constants (file extension, builtin package)
//!
//! This module has NO dependencies on other crate modules.

pub mod constants;
mod line_index;
mod position;

pub use line_index::LineIndex;
pub use position::{Position, Span};

// Re-export text-size types for convenience
pub use text_size;
pub use text_size::{TextRange, TextSize};
