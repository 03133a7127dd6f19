//! Source model of Neva files and the lowering that builds it.
//!
//! [`File`] is the serializable, declaration-ordered view of one source file
//! that the resolver hands back to clients. [`lower`] produces it from source
//! text together with the problems found at the declaration level.

mod lower;
mod model;

pub use lower::{
    FatalSyntax, IssueKind, LoweredFile, SyntaxIssue, lower, lower_parse, lower_with_cancel,
};
pub use model::{
    Component, Connection, Const, ConstValue, Directive, Entity, EntityDef, EntityKind,
    EntityRef, File, Import, Interface, Io, Meta, Node, Port, PortAddr, Receiver, Sender,
    TypeDef, TypeExpr, TypeInst, TypeParam,
};

// Re-export Position and Span from base for convenience
pub use crate::base::{Position, Span};
