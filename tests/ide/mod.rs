//! Resolver service tests
//!
//! Tests for the resolve-file request end to end:
//! - Response shape and the port index
//! - Wire format and determinism
//! - Error kinds and the node error policy
//! - Cancellation, deadlines and batches

pub mod tests_concurrency;
pub mod tests_errors;
pub mod tests_resolve_file;
