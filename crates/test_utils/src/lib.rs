//! Test support shared by the Feebook crates
//!
//! Fixtures and builders produce valid domain values, `MockPorts` bundles the
//! in-memory adapters behind every port, `generators` holds proptest
//! strategies, and `TestDatabase` boots a migrated Postgres in Docker.

mod builders;
mod database;
mod fixtures;
mod generators;
mod mocks;

pub use builders::FeePlanBuilder;
pub use database::{BoxError, TestDatabase};
pub use fixtures::*;
pub use generators::*;
pub use mocks::*;
