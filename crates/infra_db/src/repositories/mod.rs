//! Repository implementations
//!
//! Repositories hold the SQL and map between tables and plain row types.
//! They know nothing about the domain aggregates; the adapters in
//! [`crate::adapters`] do that translation.

pub mod claims;
pub mod themes;
pub mod users;

pub use claims::{ClaimFilter, ClaimGraph, ClaimsRepository};
pub use themes::{ThemeRow, ThemesRepository};
pub use users::{UserRow, UsersRepository};
