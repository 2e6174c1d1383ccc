//! Core Kernel - Foundational types for the expense reimbursement tracker
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money with exact 2-decimal arithmetic
//! - Calendar dates for activities, validated against month lengths and leap years
//! - Strongly-typed identifiers
//! - Port infrastructure for the ports-and-adapters split between domain and storage

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, MoneyError};
pub use temporal::{ActivityDate, Timezone, days_in_month};
pub use identifiers::{UserId, ClaimId, ItemId, InvoiceId, ThemeId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;
