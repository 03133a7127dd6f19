//! Domain constants.

/// Extension of Neva source files (without the dot).
pub const NEVA_EXTENSION: &str = "neva";

/// Package searched in the stdlib root for unqualified references.
pub const BUILTIN_PACKAGE: &str = "builtin";

/// Separator between a node and its dependency node in `Extra.nodesPorts` keys.
pub const NODE_PATH_SEPARATOR: char = '/';
