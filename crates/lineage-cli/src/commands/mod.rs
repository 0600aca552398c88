//! CLI command implementations

pub(crate) mod clean;
pub(crate) mod columns;
pub(crate) mod common;
pub(crate) mod joins;
pub(crate) mod summary;
pub(crate) mod tables;
