//! Rowan-based parser for Neva sources
//!
//! This module provides a lossless parser using:
//! - **logos** for fast lexing
//! - **rowan** for the CST (Concrete Syntax Tree)
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind
//!     ↓
//! Parser → GreenNode tree (immutable, cheap to clone)
//!     ↓
//! SyntaxNode (rowan) → CST with parent pointers
//!     ↓
//! AST layer → Typed wrappers over SyntaxNode
//!     ↓
//! Source model (`crate::syntax`)
//! ```

#[allow(clippy::module_inception)]
mod parser;

pub mod ast;
mod lexer;
mod syntax_kind;

pub use ast::*;
pub use lexer::{Lexer, Token, tokenize};
pub use parser::{MAX_NESTING, Parse, SyntaxError, parse, parse_with_cancel};
pub use syntax_kind::{NevaLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange, TextSize};
