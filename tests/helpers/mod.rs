//! Shared helpers for integration tests.

pub mod source_fixtures;
pub mod workspace_helpers;
