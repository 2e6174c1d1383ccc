//! Test Utilities Crate
//!
//! Shared fixtures and helpers for the expense tracker test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built users, claim forms and items
//! - `builders`: Builders for claims in any status
//! - `database`: PostgreSQL test containers with migrations applied
//! - `assertions`: Assertion helpers for claims and money
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
