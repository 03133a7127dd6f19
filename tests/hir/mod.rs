//! Resolution layer tests
//!
//! Tests for entity lookup across files and for the checks run on top of it:
//! - Same-package siblings, imports and the stdlib
//! - Visibility and unknown imports
//! - Network consistency warnings

pub mod tests_cross_file;
pub mod tests_network;
